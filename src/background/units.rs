//! Unit conversions applied to characterized impact rows.
//!
//! Characterized extensions leave the assembler in source units (kg CO2-eq
//! for global warming, tonnes for waste). Reporting uses kilotonnes, so the
//! affected rows of B, H and the direct-impact stimulus are rescaled and
//! the category units relabelled in one step. Every conversion names its
//! category, factor, and resulting unit.
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::mrio::{
    errors::{MrioError, MrioResult},
    labels::LabelCatalog,
};

/// kg → kt.
pub const KG_TO_KT: f64 = 1e-6;
/// kt → kg.
pub const KT_TO_KG: f64 = 1e6;
/// tonne → kt.
pub const TONNE_TO_KT: f64 = 1e-3;

/// Rescale one impact category row and relabel its unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversion {
    /// Impact category code.
    pub category: String,
    pub factor: f64,
    /// Unit after conversion.
    pub unit: String,
}

impl UnitConversion {
    pub fn new(category: &str, factor: f64, unit: &str) -> MrioResult<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(MrioError::InvalidFactor { name: format!("unit conversion for {category}"), value: factor });
        }
        Ok(UnitConversion { category: category.to_string(), factor, unit: unit.to_string() })
    }

    /// Multiply row `row` of `m` by the factor.
    pub fn scale_row(&self, m: &mut Array2<f64>, row: usize) {
        m.index_axis_mut(Axis(0), row).mapv_inplace(|v| v * self.factor);
    }
}

/// Default conversions: global warming kg → kt, waste tonne → kt.
pub fn default_unit_conversions(global_warming: &str, waste: &str) -> MrioResult<Vec<UnitConversion>> {
    Ok(vec![
        UnitConversion::new(global_warming, KG_TO_KT, "ktCO2eq")?,
        UnitConversion::new(waste, TONNE_TO_KT, "kt")?,
    ])
}

/// Apply `conversions` to every matrix in `rows_of` (rows indexed by
/// `categories`) and return the relabelled catalog.
///
/// Errors
/// ------
/// - `MrioError::LabelNotFound` for unknown category codes.
/// - `MrioError::DimensionMismatch` when a matrix has a different row
///   count than the catalog.
pub fn apply_conversions(
    categories: &LabelCatalog, conversions: &[UnitConversion], rows_of: &mut [&mut Array2<f64>],
) -> MrioResult<LabelCatalog> {
    for m in rows_of.iter() {
        if m.nrows() != categories.len() {
            return Err(MrioError::DimensionMismatch {
                matrix: "characterized rows",
                expected: (categories.len(), m.ncols()),
                found: m.dim(),
            });
        }
    }
    let mut relabelled = categories.clone();
    for conv in conversions {
        let row = categories.position(&conv.category)?;
        for m in rows_of.iter_mut() {
            conv.scale_row(m, row);
        }
        relabelled = relabelled.with_unit_at(row, &conv.unit)?;
        log::debug!("Converted '{}' by factor {} to {}", conv.category, conv.factor, conv.unit);
    }
    Ok(relabelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mrio::labels::Label;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Row scaling and unit relabelling for named categories.
    // - Guards on factors, unknown categories, and row counts.
    // -------------------------------------------------------------------------

    fn categories() -> LabelCatalog {
        LabelCatalog::new(
            "characterization",
            vec![
                Label::with_unit("GWP", "Global warming", "kg CO2 eq."),
                Label::with_unit("VA", "Value added", "M.EUR"),
                Label::with_unit("WASTE", "Waste generation", "tonne"),
            ],
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify that only the named rows change, in every matrix, and that
    // units are relabelled.
    //
    // Given
    // -----
    // - Two 3-row matrices and the default conversions.
    //
    // Expect
    // ------
    // - GWP rows ×1e-6, waste rows ×1e-3, VA rows untouched.
    fn apply_conversions_scales_named_rows_only() {
        let mut b = array![[2e6, 4e6], [1.0, 2.0], [3e3, 0.0]];
        let mut h = array![[1e6], [5.0], [1e3]];
        let conv = default_unit_conversions("GWP", "WASTE").unwrap();

        let cats = apply_conversions(&categories(), &conv, &mut [&mut b, &mut h]).unwrap();

        assert_eq!(b, array![[2.0, 4.0], [1.0, 2.0], [3.0, 0.0]]);
        assert_eq!(h, array![[1.0], [5.0], [1.0]]);
        assert_eq!(cats.label(0).unit.as_deref(), Some("ktCO2eq"));
        assert_eq!(cats.label(1).unit.as_deref(), Some("M.EUR"));
        assert_eq!(cats.label(2).unit.as_deref(), Some("kt"));
    }

    #[test]
    // Purpose
    // -------
    // Ensure invalid factors, unknown categories, and misaligned matrices are
    // rejected.
    //
    // Expect
    // ------
    // - `InvalidFactor`, `LabelNotFound`, and `DimensionMismatch`.
    fn conversions_reject_invalid_input() {
        assert!(matches!(UnitConversion::new("GWP", 0.0, "kt").unwrap_err(), MrioError::InvalidFactor { .. }));

        let conv = vec![UnitConversion::new("CO2", 1e-6, "kt").unwrap()];
        let mut b = Array2::<f64>::zeros((3, 1));
        assert!(matches!(
            apply_conversions(&categories(), &conv, &mut [&mut b]).unwrap_err(),
            MrioError::LabelNotFound { .. }
        ));

        let mut short = Array2::<f64>::zeros((2, 1));
        assert!(matches!(
            apply_conversions(&categories(), &[], &mut [&mut short]).unwrap_err(),
            MrioError::DimensionMismatch { .. }
        ));
    }
}
