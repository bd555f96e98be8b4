//! Aggregation — 0/1 grouping matrices for reporting.
//!
//! - [`Aggregation::regions`] groups the full region catalog into a coarse
//!   set of reporting regions (by default the Netherlands and five world
//!   regions).
//! - [`Aggregation::sectors`] groups industries through a
//!   disaggregate → aggregate concordance.
//!
//! Both produce `g` with `g[group, member] = 1` when the member belongs to
//! the group. Aggregating a member-indexed vector `v` is `g · v`.
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::mrio::{
    errors::{MrioError, MrioResult},
    labels::{Label, LabelCatalog},
};

/// Default reporting regions, in output order.
pub const DEFAULT_REGION_GROUPS: [&str; 6] = ["NL", "WE", "WA", "WL", "WM", "WF"];

/// `Aggregation` — group catalog plus its grouping matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub groups: LabelCatalog,
    pub g: Array2<f64>,
}

impl Aggregation {
    /// Region aggregation from per-region group membership.
    ///
    /// Parameters
    /// ----------
    /// - `regions`: `&LabelCatalog`
    ///   Full region catalog (members).
    /// - `membership`: `&[Label]`
    ///   Group code and name for each region, parallel to `regions`.
    /// - `order`: `&[S]`
    ///   Group codes in output order.
    ///
    /// Errors
    /// ------
    /// - `MrioError::DimensionMismatch` when `membership` is not parallel to
    ///   `regions`.
    /// - `MrioError::LabelNotFound` for a requested group without members.
    pub fn regions<S: AsRef<str>>(regions: &LabelCatalog, membership: &[Label], order: &[S]) -> MrioResult<Self> {
        if membership.len() != regions.len() {
            return Err(MrioError::DimensionMismatch {
                matrix: "region membership",
                expected: (regions.len(), 1),
                found: (membership.len(), 1),
            });
        }
        let mut g = Array2::<f64>::zeros((order.len(), regions.len()));
        let mut labels = Vec::with_capacity(order.len());
        for (k, code) in order.iter().enumerate() {
            let code = code.as_ref();
            let first = membership.iter().position(|m| m.code == code).ok_or_else(|| {
                MrioError::LabelNotFound { catalog: "region groups".into(), code: code.to_string() }
            })?;
            labels.push(Label::new(code, membership[first].name.clone()));
            for (j, m) in membership.iter().enumerate() {
                if m.code == code {
                    g[[k, j]] = 1.0;
                }
            }
        }
        Ok(Aggregation { groups: LabelCatalog::new("region groups", labels)?, g })
    }

    /// Sector aggregation from a concordance.
    ///
    /// Parameters
    /// ----------
    /// - `industries`: `&LabelCatalog`
    ///   Full industry catalog (members).
    /// - `groups`: `LabelCatalog`
    ///   Aggregate sector catalog.
    /// - `concordance`: `&[(S, S)]`
    ///   `(industry code, group code)` pairs.
    ///
    /// Errors
    /// ------
    /// - `MrioError::LabelNotFound` for unknown codes on either side.
    /// - `MrioError::DuplicateLabel` when an industry is assigned twice.
    pub fn sectors<S: AsRef<str>>(
        industries: &LabelCatalog, groups: LabelCatalog, concordance: &[(S, S)],
    ) -> MrioResult<Self> {
        let mut g = Array2::<f64>::zeros((groups.len(), industries.len()));
        let mut assigned = vec![false; industries.len()];
        for (member, group) in concordance {
            let j = industries.position(member.as_ref())?;
            let k = groups.position(group.as_ref())?;
            if assigned[j] {
                return Err(MrioError::DuplicateLabel {
                    catalog: "sector concordance".into(),
                    code: member.as_ref().to_string(),
                });
            }
            assigned[j] = true;
            g[[k, j]] = 1.0;
        }
        Ok(Aggregation { groups, g })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn members(&self) -> usize {
        self.g.ncols()
    }

    /// Aggregate a member-indexed vector.
    pub fn apply(&self, v: &Array1<f64>) -> Array1<f64> {
        self.g.dot(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Region grouping by membership in requested order.
    // - Sector grouping from a concordance, with duplicate/unknown guards.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify region groups follow the requested order and pick up every
    // member.
    //
    // Given
    // -----
    // - Regions NL, DE, FR, CN with groups NL, WE, WE, WA; order [NL, WE, WA].
    //
    // Expect
    // ------
    // - g = [[1,0,0,0],[0,1,1,0],[0,0,0,1]]; group names from membership.
    fn regions_groups_members_in_requested_order() {
        let regions = LabelCatalog::from_codes("region", &["NL", "DE", "FR", "CN"]).unwrap();
        let membership = vec![
            Label::new("NL", "Netherlands"),
            Label::new("WE", "Rest of Europe"),
            Label::new("WE", "Rest of Europe"),
            Label::new("WA", "Asia and Pacific"),
        ];

        let agg = Aggregation::regions(&regions, &membership, &["NL", "WE", "WA"]).unwrap();

        assert_eq!(agg.g, array![[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0]]);
        assert_eq!(agg.groups.label(1).name, "Rest of Europe");
        assert_eq!(agg.apply(&array![1.0, 2.0, 3.0, 4.0]), array![1.0, 5.0, 4.0]);
    }

    #[test]
    // Purpose
    // -------
    // Ensure requesting a group with no members is a lookup error.
    //
    // Expect
    // ------
    // - `LabelNotFound` for "WF".
    fn regions_rejects_empty_group() {
        let regions = LabelCatalog::from_codes("region", &["NL"]).unwrap();
        let membership = vec![Label::new("NL", "Netherlands")];

        let err = Aggregation::regions(&regions, &membership, &["NL", "WF"]).unwrap_err();

        assert_eq!(err, MrioError::LabelNotFound { catalog: "region groups".into(), code: "WF".into() });
    }

    #[test]
    // Purpose
    // -------
    // Verify concordance-based sector grouping and its guards.
    //
    // Given
    // -----
    // - Industries S1..S3 grouped into G1 = {S1, S3}, G2 = {S2}.
    //
    // Expect
    // ------
    // - g = [[1,0,1],[0,1,0]]; assigning S1 twice → `DuplicateLabel`.
    fn sectors_builds_grouping_from_concordance() {
        let industries = LabelCatalog::from_codes("industry", &["S1", "S2", "S3"]).unwrap();
        let groups = LabelCatalog::from_codes("sector groups", &["G1", "G2"]).unwrap();

        let agg =
            Aggregation::sectors(&industries, groups.clone(), &[("S1", "G1"), ("S2", "G2"), ("S3", "G1")]).unwrap();
        assert_eq!(agg.g, array![[1.0, 0.0, 1.0], [0.0, 1.0, 0.0]]);

        let err = Aggregation::sectors(&industries, groups, &[("S1", "G1"), ("S1", "G2")]).unwrap_err();
        assert!(matches!(err, MrioError::DuplicateLabel { .. }));
    }
}
