//! OData pagination — bounded retrieval of observation tables.
//!
//! Purpose
//! -------
//! Retrieve every row of a remote observation table that is served as a
//! chain of JSON pages. Each page carries its rows under `"value"` and, if
//! more rows follow, the URL of the next page under `"@odata.nextLink"`.
//!
//! Key behaviors
//! -------------
//! - [`fetch_all`] follows `@odata.nextLink` until it disappears, parsing
//!   every row into an [`Observation`].
//! - Transport failures are retried up to [`FetchPolicy::max_attempts`]
//!   times per page; malformed pages fail immediately.
//! - The number of pages is bounded by [`FetchPolicy::max_pages`]; a chain
//!   that is still going after that many pages is an error rather than an
//!   endless loop.
//! - [`select_value`] picks the single observation matching a set of
//!   dimension filters.
//!
//! Conventions
//! -----------
//! - The transport itself is supplied by the caller through [`PageSource`];
//!   closures `FnMut(&str) -> anyhow::Result<serde_json::Value>` implement
//!   it directly.
//! - Dimension values are kept as strings; numeric dimension values are
//!   stored in their JSON text form.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::statistics::errors::{StatsError, StatsResult};

/// Key holding the row array of a page.
pub const VALUE_KEY: &str = "value";
/// Key holding the URL of the next page.
pub const NEXT_LINK_KEY: &str = "@odata.nextLink";
/// Row field holding the numeric observation.
pub const OBSERVATION_VALUE_FIELD: &str = "Value";

/// Delivers one JSON page for a URL.
pub trait PageSource {
    fn fetch_page(&mut self, url: &str) -> anyhow::Result<Value>;
}

impl<F> PageSource for F
where
    F: FnMut(&str) -> anyhow::Result<Value>,
{
    fn fetch_page(&mut self, url: &str) -> anyhow::Result<Value> {
        self(url)
    }
}

/// Bounds on a paginated fetch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchPolicy {
    /// Maximum number of pages followed for one table.
    pub max_pages: usize,
    /// Attempts per page (first try included).
    pub max_attempts: usize,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        FetchPolicy { max_pages: 1000, max_attempts: 3 }
    }
}

impl FetchPolicy {
    pub fn validate(&self) -> StatsResult<()> {
        if self.max_pages == 0 {
            return Err(StatsError::InvalidPolicy { field: "max_pages" });
        }
        if self.max_attempts == 0 {
            return Err(StatsError::InvalidPolicy { field: "max_attempts" });
        }
        Ok(())
    }
}

/// One row of an observation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Dimension and attribute columns (e.g. `Measure`, `Perioden`).
    pub fields: BTreeMap<String, String>,
    /// Observed value; `None` when the source reports null.
    pub value: Option<f64>,
}

impl Observation {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    fn matches(&self, filters: &[(&str, &str)]) -> bool {
        filters.iter().all(|(name, want)| self.field(name) == Some(*want))
    }

    fn from_json(url: &str, row: &Value) -> StatsResult<Self> {
        let object = row.as_object().ok_or_else(|| StatsError::MalformedResponse {
            url: url.to_string(),
            text: format!("row is not an object: {row}"),
        })?;
        let mut fields = BTreeMap::new();
        let mut value = None;
        for (key, v) in object {
            if key == OBSERVATION_VALUE_FIELD {
                value = match v {
                    Value::Null => None,
                    Value::Number(n) => n.as_f64(),
                    other => {
                        return Err(StatsError::MalformedResponse {
                            url: url.to_string(),
                            text: format!("non-numeric {OBSERVATION_VALUE_FIELD}: {other}"),
                        });
                    }
                };
                continue;
            }
            match v {
                Value::Null => {}
                Value::String(s) => {
                    fields.insert(key.clone(), s.trim().to_string());
                }
                other => {
                    fields.insert(key.clone(), other.to_string());
                }
            }
        }
        Ok(Observation { fields, value })
    }
}

/// Fetch every row of a paginated table.
///
/// Parameters
/// ----------
/// - `source`: `&mut P`
///   Transport delivering JSON pages.
/// - `url`: `&str`
///   URL of the first page.
/// - `policy`: `&FetchPolicy`
///   Page and retry bounds.
///
/// Returns
/// -------
/// `StatsResult<Vec<Observation>>`
///   Rows of all pages in delivery order.
///
/// Errors
/// ------
/// - `StatsError::InvalidPolicy` for a zero bound.
/// - `StatsError::Transport` when a page still fails after
///   `max_attempts` tries.
/// - `StatsError::MalformedResponse` for pages without a `value` array or
///   with a non-string next link.
/// - `StatsError::PageLimitExceeded` when more than `max_pages` pages
///   would be needed.
pub fn fetch_all<P: PageSource + ?Sized>(
    source: &mut P, url: &str, policy: &FetchPolicy,
) -> StatsResult<Vec<Observation>> {
    policy.validate()?;
    let mut rows = Vec::new();
    let mut next = Some(url.to_string());
    let mut pages = 0usize;
    while let Some(target) = next {
        if pages == policy.max_pages {
            return Err(StatsError::PageLimitExceeded { url: url.to_string(), max_pages: policy.max_pages });
        }
        let page = fetch_with_retry(source, &target, policy.max_attempts)?;
        pages += 1;
        let (mut batch, link) = parse_page(&target, &page)?;
        rows.append(&mut batch);
        next = link;
    }
    log::debug!("Fetched {} observations from {url} in {pages} pages", rows.len());
    Ok(rows)
}

fn fetch_with_retry<P: PageSource + ?Sized>(source: &mut P, url: &str, max_attempts: usize) -> StatsResult<Value> {
    let mut attempt = 1;
    loop {
        match source.fetch_page(url) {
            Ok(page) => return Ok(page),
            Err(err) if attempt < max_attempts => {
                log::warn!("Fetching {url} failed (attempt {attempt}/{max_attempts}): {err}");
                attempt += 1;
            }
            Err(err) => return Err(StatsError::Transport { url: url.to_string(), text: err.to_string() }),
        }
    }
}

fn parse_page(url: &str, page: &Value) -> StatsResult<(Vec<Observation>, Option<String>)> {
    let rows = page.get(VALUE_KEY).and_then(Value::as_array).ok_or_else(|| StatsError::MalformedResponse {
        url: url.to_string(),
        text: format!("missing '{VALUE_KEY}' array"),
    })?;
    let observations = rows.iter().map(|row| Observation::from_json(url, row)).collect::<StatsResult<Vec<_>>>()?;
    let next = match page.get(NEXT_LINK_KEY) {
        None | Some(Value::Null) => None,
        Some(Value::String(link)) => Some(link.clone()),
        Some(other) => {
            return Err(StatsError::MalformedResponse {
                url: url.to_string(),
                text: format!("'{NEXT_LINK_KEY}' is not a string: {other}"),
            });
        }
    };
    Ok((observations, next))
}

/// Value of the single observation matching every `(field, value)` filter.
///
/// Errors
/// ------
/// - `StatsError::ObservationNotFound` when nothing matches.
/// - `StatsError::AmbiguousObservation` when several rows match.
/// - `StatsError::MissingValue` when the match has a null value.
pub fn select_value(observations: &[Observation], filters: &[(&str, &str)]) -> StatsResult<f64> {
    let mut matches = observations.iter().filter(|o| o.matches(filters));
    let describe = || filters.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(", ");
    let first = matches.next().ok_or_else(|| StatsError::ObservationNotFound { filters: describe() })?;
    let extra = matches.count();
    if extra > 0 {
        return Err(StatsError::AmbiguousObservation { filters: describe(), count: extra + 1 });
    }
    first.value.ok_or_else(|| StatsError::MissingValue { filters: describe() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Following next links across pages.
    // - Bounded retries of transport failures and the page-count bound.
    // - Malformed pages.
    // - Single-match selection.
    // -------------------------------------------------------------------------

    fn page(rows: Value, next: Option<&str>) -> Value {
        match next {
            Some(link) => json!({ "value": rows, "@odata.nextLink": link }),
            None => json!({ "value": rows }),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that rows from all pages are collected in order.
    //
    // Given
    // -----
    // - Two pages linked by `@odata.nextLink`.
    //
    // Expect
    // ------
    // - Three observations, fields parsed, null value kept as `None`.
    fn fetch_all_follows_next_links() {
        let mut source = |url: &str| -> anyhow::Result<Value> {
            Ok(match url {
                "p1" => page(json!([{ "Measure": "M1", "Value": 1.5 }, { "Measure": "M2", "Value": null }]), Some("p2")),
                _ => page(json!([{ "Measure": "M3", "Perioden": "2016JJ00", "Value": 3 }]), None),
            })
        };

        let rows = fetch_all(&mut source, "p1", &FetchPolicy::default()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].value, Some(1.5));
        assert_eq!(rows[1].value, None);
        assert_eq!(rows[2].field("Perioden"), Some("2016JJ00"));
        assert_eq!(rows[2].value, Some(3.0));
    }

    #[test]
    // Purpose
    // -------
    // Verify that transient failures are retried within the attempt bound
    // and surface as `Transport` beyond it.
    //
    // Given
    // -----
    // - A source failing twice before succeeding.
    //
    // Expect
    // ------
    // - Success with 3 attempts; `Transport` with 2 attempts.
    fn fetch_all_retries_transport_failures_within_bound() {
        let make = || {
            let mut calls = 0;
            move |_: &str| -> anyhow::Result<Value> {
                calls += 1;
                if calls <= 2 {
                    anyhow::bail!("timeout")
                }
                Ok(page(json!([{ "Value": 7.0 }]), None))
            }
        };

        let mut ok_source = make();
        let rows = fetch_all(&mut ok_source, "p1", &FetchPolicy { max_pages: 10, max_attempts: 3 }).unwrap();
        assert_eq!(rows[0].value, Some(7.0));

        let mut failing = make();
        let err = fetch_all(&mut failing, "p1", &FetchPolicy { max_pages: 10, max_attempts: 2 }).unwrap_err();
        assert_eq!(err, StatsError::Transport { url: "p1".into(), text: "timeout".into() });
    }

    #[test]
    // Purpose
    // -------
    // Ensure a pagination chain that never ends is cut off.
    //
    // Given
    // -----
    // - Every page links to itself; max_pages = 5.
    //
    // Expect
    // ------
    // - `PageLimitExceeded` after 5 pages.
    fn fetch_all_bounds_page_count() {
        let mut pages = 0;
        let mut source = |_: &str| -> anyhow::Result<Value> {
            pages += 1;
            Ok(page(json!([]), Some("again")))
        };

        let err = fetch_all(&mut source, "start", &FetchPolicy { max_pages: 5, max_attempts: 1 }).unwrap_err();

        assert_eq!(err, StatsError::PageLimitExceeded { url: "start".into(), max_pages: 5 });
        assert_eq!(pages, 5);
    }

    #[test]
    // Purpose
    // -------
    // Ensure malformed pages fail without retry.
    //
    // Given
    // -----
    // - A page without a `value` array.
    //
    // Expect
    // ------
    // - `MalformedResponse` after a single call.
    fn fetch_all_rejects_page_without_rows() {
        let mut calls = 0;
        let mut source = |_: &str| -> anyhow::Result<Value> {
            calls += 1;
            Ok(json!({ "odata.error": "bad request" }))
        };

        let err = fetch_all(&mut source, "p1", &FetchPolicy::default()).unwrap_err();

        assert!(matches!(err, StatsError::MalformedResponse { .. }));
        assert_eq!(calls, 1);
    }

    #[test]
    // Purpose
    // -------
    // Verify single-match selection and its failure modes.
    //
    // Given
    // -----
    // - Two rows for 2016 with different measures, one row for 2017.
    //
    // Expect
    // ------
    // - Exact filter → value; period-only filter for 2016 → ambiguous;
    //   unknown period → not found.
    fn select_value_requires_exactly_one_match() {
        let rows = vec![
            Observation::from_json("t", &json!({ "Measure": "M006309", "Perioden": "2016JJ00", "Value": 4.2 })).unwrap(),
            Observation::from_json("t", &json!({ "Measure": "M000001", "Perioden": "2016JJ00", "Value": 1.0 })).unwrap(),
            Observation::from_json("t", &json!({ "Measure": "M006309", "Perioden": "2017JJ00", "Value": 4.0 })).unwrap(),
        ];

        let v = select_value(&rows, &[("Measure", "M006309"), ("Perioden", "2016JJ00")]).unwrap();
        assert_eq!(v, 4.2);

        let err = select_value(&rows, &[("Perioden", "2016JJ00")]).unwrap_err();
        assert!(matches!(err, StatsError::AmbiguousObservation { count: 2, .. }));

        let err = select_value(&rows, &[("Perioden", "2020JJ00")]).unwrap_err();
        assert!(matches!(err, StatsError::ObservationNotFound { .. }));
    }
}
