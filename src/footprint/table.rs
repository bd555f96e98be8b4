//! Labelled footprint tables.
//!
//! A [`FootprintTable`] pairs a decomposition result with its row keys
//! `(region, sector)` and its impact-category columns (code, name, unit), in
//! the order a report lists them.
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::{
    footprint::breakdown::Breakdown,
    mrio::{
        aggregation::Aggregation,
        errors::{MrioError, MrioResult},
        labels::{Label, LabelCatalog, LabelSet},
    },
};

/// `FootprintTable` — rows × selected impact categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintTable {
    pub rows: Vec<(String, String)>,
    pub columns: Vec<Label>,
    pub values: Array2<f64>,
}

impl FootprintTable {
    /// Label a `(nr·ns) × nq` result and keep the selected categories.
    ///
    /// Parameters
    /// ----------
    /// - `values`: `&Array2<f64>`
    ///   One row per region×sector, one column per entry of `categories`.
    /// - `labels`: `&LabelSet`
    ///   Supplies the `(region, sector)` row keys in catalog order.
    /// - `categories`: `&LabelCatalog`
    ///   Column catalog of `values`.
    /// - `selected`: `&[S]`
    ///   Category codes or names, in output order.
    ///
    /// Errors
    /// ------
    /// - `MrioError::DimensionMismatch` when `values` does not match the
    ///   catalogs.
    /// - `MrioError::LabelNotFound` for an unknown selected category.
    pub fn from_array<S: AsRef<str>>(
        values: &Array2<f64>, labels: &LabelSet, categories: &LabelCatalog, selected: &[S],
    ) -> MrioResult<Self> {
        let expected = (labels.n_sectors(), categories.len());
        if values.dim() != expected {
            return Err(MrioError::DimensionMismatch { matrix: "footprint values", expected, found: values.dim() });
        }
        let positions =
            selected.iter().map(|key| categories.position_by_code_or_name(key.as_ref())).collect::<MrioResult<Vec<_>>>()?;
        let columns = positions.iter().map(|&p| categories.label(p).clone()).collect();
        Ok(FootprintTable { rows: labels.region_sector_keys(), columns, values: values.select(Axis(1), &positions) })
    }

    /// One table per decomposition column, as produced by the hotspot or
    /// contribution functions.
    pub fn from_arrays<S: AsRef<str>>(
        values: &[Array2<f64>], labels: &LabelSet, categories: &LabelCatalog, selected: &[S],
    ) -> MrioResult<Vec<Self>> {
        values.iter().map(|v| FootprintTable::from_array(v, labels, categories, selected)).collect()
    }

    /// Regroup the rows for a report breakdown.
    ///
    /// Errors
    /// ------
    /// - `MrioError::DimensionMismatch` when the table was not built over
    ///   `labels`, or the aggregations do not cover its regions and sectors.
    pub fn grouped(
        &self, breakdown: Breakdown, labels: &LabelSet, ragg: &Aggregation, sagg: &Aggregation,
    ) -> MrioResult<Self> {
        let (nr, ns) = (labels.nr(), labels.ns());
        let values = breakdown.apply(&self.values, nr, ns, ragg, sagg)?;
        let regions: Vec<String> = labels.region.codes().map(str::to_string).collect();
        let sectors: Vec<String> = labels.industry.codes().map(str::to_string).collect();
        Ok(FootprintTable {
            rows: breakdown.row_keys(&regions, &sectors, ragg, sagg),
            columns: self.columns.clone(),
            values,
        })
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    /// Row for a `(region, sector)` key, if present.
    pub fn row(&self, region: &str, sector: &str) -> Option<ArrayView1<'_, f64>> {
        self.rows.iter().position(|(r, s)| r == region && s == sector).map(|i| self.values.row(i))
    }
}
