//! Waste extension — map a waste supply table onto the MRIO catalogs.
//!
//! The waste accounts come from a supply table with a slightly different
//! classification than the MRIO: one region fewer, one extra industry code
//! (a split gas-manufacturing activity), and one final-demand category
//! fewer. Each source column is summed over its waste types and written to
//! the matching (region, industry) or (region, final-demand) position.
//!
//! Notes
//! -----
//! - Industry codes that are not in the MRIO catalog are resolved through
//!   an alias table ([`default_industry_aliases`]); anything still unknown
//!   is a lookup error.
//! - Several source columns may land on the same target (alias + original);
//!   their totals are accumulated.
//! - Final-demand categories are matched by position: source category `j`
//!   goes to MRIO category `j`.
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::mrio::{
    errors::{MrioError, MrioResult},
    labels::LabelSet,
};

/// Unit of the waste accounts.
pub const WASTE_UNIT: &str = "tonne";

/// Source industry codes that map onto a different MRIO industry.
pub fn default_industry_aliases() -> Vec<(String, String)> {
    vec![("A_MGWG".to_string(), "A_GASD".to_string())]
}

/// Waste supply tables in source layout.
///
/// Column `c` of `industry_flows` belongs to region `c / industries.len()`
/// and industry `c % industries.len()`; `final_flows` and `stock_flows` use
/// `final_categories` the same way.
#[derive(Debug, Clone, PartialEq)]
pub struct WasteTables {
    pub regions: Vec<String>,
    pub industries: Vec<String>,
    pub final_categories: usize,
    pub industry_flows: Array2<f64>,
    pub final_flows: Array2<f64>,
    /// Waste released from stock, added to final-demand waste.
    pub stock_flows: Array2<f64>,
}

/// `WasteExtension` — one extension row over sectors and over final demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteExtension {
    pub unit: String,
    /// Waste per region×sector (`nr·ns`).
    pub r: Array1<f64>,
    /// Waste per region×final-demand category (`nr·ny`).
    pub h: Array1<f64>,
}

impl WasteExtension {
    /// Map the waste tables onto `labels`.
    ///
    /// Errors
    /// ------
    /// - `MrioError::DimensionMismatch` when column counts disagree with
    ///   the declared regions/industries/categories, or when the source has
    ///   more final categories than the MRIO.
    /// - `MrioError::LabelNotFound` for unknown region or industry codes.
    /// - `MrioError::NonFiniteEntry` for NaN/±inf flows.
    pub fn from_tables(labels: &LabelSet, tables: &WasteTables, aliases: &[(String, String)]) -> MrioResult<Self> {
        let nrw = tables.regions.len();
        let nsw = tables.industries.len();
        let nyw = tables.final_categories;
        let (ns, ny) = (labels.ns(), labels.ny());

        if nyw > ny {
            return Err(MrioError::DimensionMismatch {
                matrix: "waste final demand",
                expected: (ny, 1),
                found: (nyw, 1),
            });
        }
        check_columns("waste industry", &tables.industry_flows, nrw * nsw)?;
        check_columns("waste final demand", &tables.final_flows, nrw * nyw)?;
        check_columns("waste from stock", &tables.stock_flows, nrw * nyw)?;

        let region_pos = tables
            .regions
            .iter()
            .map(|code| labels.region.position(code))
            .collect::<MrioResult<Vec<usize>>>()?;
        let industry_pos = tables
            .industries
            .iter()
            .map(|code| {
                let target = aliases.iter().find(|(from, _)| from == code).map(|(_, to)| to).unwrap_or(code);
                labels.industry.position(target)
            })
            .collect::<MrioResult<Vec<usize>>>()?;

        let industry_totals = column_totals("waste industry", &tables.industry_flows)?;
        let final_totals = column_totals("waste final demand", &tables.final_flows)?
            + column_totals("waste from stock", &tables.stock_flows)?;

        let mut r = Array1::<f64>::zeros(labels.n_sectors());
        let mut h = Array1::<f64>::zeros(labels.n_demands());
        for (i, &reg) in region_pos.iter().enumerate() {
            for (j, &ind) in industry_pos.iter().enumerate() {
                r[reg * ns + ind] += industry_totals[i * nsw + j];
            }
            for j in 0..nyw {
                h[reg * ny + j] += final_totals[i * nyw + j];
            }
        }
        Ok(WasteExtension { unit: WASTE_UNIT.to_string(), r, h })
    }
}

fn check_columns(matrix: &'static str, m: &Array2<f64>, expected: usize) -> MrioResult<()> {
    if m.ncols() != expected {
        return Err(MrioError::DimensionMismatch {
            matrix,
            expected: (m.nrows(), expected),
            found: m.dim(),
        });
    }
    Ok(())
}

fn column_totals(matrix: &'static str, m: &Array2<f64>) -> MrioResult<Array1<f64>> {
    crate::mrio::system::check_finite(matrix, m)?;
    Ok(m.sum_axis(Axis(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mrio::labels::LabelCatalog;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Placement of column totals by region/industry code, including the
    //   alias and the missing region.
    // - Stock waste added to final-demand waste.
    // - Lookup errors for unknown codes.
    // -------------------------------------------------------------------------

    fn labels() -> LabelSet {
        LabelSet::new(
            LabelCatalog::from_codes("region", &["NL", "DE", "WF"]).unwrap(),
            LabelCatalog::from_codes("industry", &["A_HEAL", "A_GASD"]).unwrap(),
            LabelCatalog::from_codes("final", &["HH", "GOV"]).unwrap(),
            LabelCatalog::from_codes("primary", &["VA"]).unwrap(),
            LabelCatalog::from_codes("extension", &["VA"]).unwrap(),
            LabelCatalog::from_codes("characterization", &["GWP"]).unwrap(),
        )
        .unwrap()
    }

    // Source: regions DE, NL (no WF); industries A_HEAL, A_GASD, A_MGWG; one
    // final category; two waste types per column.
    fn tables() -> WasteTables {
        WasteTables {
            regions: vec!["DE".into(), "NL".into()],
            industries: vec!["A_HEAL".into(), "A_GASD".into(), "A_MGWG".into()],
            final_categories: 1,
            industry_flows: array![[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [1.0, 0.0, 0.0, 0.0, 0.0, 1.0]],
            final_flows: array![[7.0, 8.0], [0.0, 1.0]],
            stock_flows: array![[0.5, 0.0], [0.0, 0.0]],
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify region/industry placement, alias accumulation, and the
    // zero row for the region missing from the source.
    //
    // Given
    // -----
    // - DE columns [2, 2, 3], NL columns [4, 5, 7] after summing waste types.
    //
    // Expect
    // ------
    // - r = [NL: 4, 5+7, DE: 2, 2+3, WF: 0, 0].
    // - h = [NL: 9, 0, DE: 7.5, 0, WF: 0, 0].
    fn from_tables_places_totals_by_code() {
        let w = WasteExtension::from_tables(&labels(), &tables(), &default_industry_aliases()).unwrap();

        assert_eq!(w.r, array![4.0, 12.0, 2.0, 5.0, 0.0, 0.0]);
        assert_eq!(w.h, array![9.0, 0.0, 7.5, 0.0, 0.0, 0.0]);
        assert_eq!(w.unit, WASTE_UNIT);
    }

    #[test]
    // Purpose
    // -------
    // Ensure an unmapped industry code is a lookup error.
    //
    // Given
    // -----
    // - No alias table, so "A_MGWG" is unknown.
    //
    // Expect
    // ------
    // - `LabelNotFound` for "A_MGWG".
    fn from_tables_rejects_unknown_industry_without_alias() {
        let err = WasteExtension::from_tables(&labels(), &tables(), &[]).unwrap_err();

        assert_eq!(err, MrioError::LabelNotFound { catalog: "industry".into(), code: "A_MGWG".into() });
    }

    #[test]
    // Purpose
    // -------
    // Ensure column counts are validated against the declared layout.
    //
    // Given
    // -----
    // - final_flows with 3 columns for 2 regions × 1 category.
    //
    // Expect
    // ------
    // - `DimensionMismatch`.
    fn from_tables_rejects_misaligned_columns() {
        let mut t = tables();
        t.final_flows = Array2::zeros((2, 3));

        let err = WasteExtension::from_tables(&labels(), &t, &default_industry_aliases()).unwrap_err();

        assert!(matches!(err, MrioError::DimensionMismatch { matrix: "waste final demand", .. }));
    }
}
