//! Characterization — scatter characterization factors into the indicator
//! matrix Q.
//!
//! Purpose
//! -------
//! Build the sparse `nq × ne` indicator matrix that turns raw extension rows
//! (emissions, resources, materials, factor inputs) into a handful of impact
//! categories. Each category is one row of one characterization sheet; the
//! sheet's columns line up with a contiguous block of extension rows that
//! starts at the sheet's `offset`.
//!
//! Key behaviors
//! -------------
//! - [`IndicatorMatrix::build`] copies the non-zero factors of every
//!   selected sheet row into Q and records each category's name and unit.
//! - [`exiobase_indicator_specs`] lists the six default categories with the
//!   display names used in reporting.
//!
//! Invariants & assumptions
//! ------------------------
//! - `offset + sheet.factors.ncols() <= ne` for every sheet; violations are
//!   dimension errors, not silent truncation.
//! - Every category states its unit; no unit conversion happens here. Unit
//!   conversions are applied later to the characterized matrices.
use ndarray::{Array2, s};
use serde::{Deserialize, Serialize};

use crate::mrio::{
    errors::{MrioError, MrioResult},
    labels::{Label, LabelCatalog},
};

/// Column offset of the factor-inputs sheet in the Exiobase 3.7 extensions.
pub const FACTOR_INPUTS_OFFSET: usize = 0;
/// Column offset of the emissions sheet.
pub const EMISSIONS_OFFSET: usize = 23;
/// Column offset of the resources sheet.
pub const RESOURCES_OFFSET: usize = 446;
/// Column offset of the materials sheet.
pub const MATERIALS_OFFSET: usize = 466;

/// One characterization sheet: rows are candidate impact categories,
/// columns are a contiguous block of raw extension rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterizationSheet {
    pub name: String,
    /// First extension row covered by column 0 of `factors`.
    pub offset: usize,
    /// Name and unit of every row of `factors`.
    pub rows: Vec<Label>,
    pub factors: Array2<f64>,
}

impl CharacterizationSheet {
    /// Construct a sheet after checking that `rows` labels every factor row.
    pub fn new(name: impl Into<String>, offset: usize, rows: Vec<Label>, factors: Array2<f64>) -> MrioResult<Self> {
        if rows.len() != factors.nrows() {
            return Err(MrioError::DimensionMismatch {
                matrix: "characterization sheet",
                expected: (rows.len(), factors.ncols()),
                found: factors.dim(),
            });
        }
        Ok(CharacterizationSheet { name: name.into(), offset, rows, factors })
    }
}

/// Selects one sheet row as one impact category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    /// Short code of the impact category (e.g. `"GWP"`).
    pub code: String,
    pub sheet: String,
    pub row: usize,
    /// Display name; the sheet row name when `None`.
    pub name: Option<String>,
    /// Unit; the sheet row unit when `None`.
    pub unit: Option<String>,
}

impl IndicatorSpec {
    pub fn new(code: &str, sheet: &str, row: usize, name: Option<&str>) -> IndicatorSpec {
        IndicatorSpec {
            code: code.to_string(),
            sheet: sheet.to_string(),
            row,
            name: name.map(str::to_string),
            unit: None,
        }
    }
}

/// Default impact categories for Exiobase 3.7 with adapted DESIRE
/// characterization factors.
pub fn exiobase_indicator_specs() -> Vec<IndicatorSpec> {
    vec![
        IndicatorSpec::new("GWP", "Q_emissions", 5, Some("Global warming")),
        IndicatorSpec::new("MAT", "Q_materials", 4, Some("Material extraction")),
        IndicatorSpec::new("WATER", "Q_materials", 12, Some("Blue water consumption")),
        IndicatorSpec::new("LAND", "Q_resources", 0, None),
        IndicatorSpec::new("VA", "Q_factorinputs", 0, Some("Value added")),
        IndicatorSpec::new("EMP", "Q_factorinputs", 1, None),
    ]
}

/// `IndicatorMatrix` — Q together with its impact-category catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorMatrix {
    pub categories: LabelCatalog,
    pub q: Array2<f64>,
}

impl IndicatorMatrix {
    /// Build Q from characterization sheets.
    ///
    /// Parameters
    /// ----------
    /// - `ne`: `usize`
    ///   Number of raw extension rows (columns of Q).
    /// - `sheets`: `&[CharacterizationSheet]`
    ///   Available sheets, looked up by name.
    /// - `specs`: `&[IndicatorSpec]`
    ///   One entry per impact category, in output row order.
    ///
    /// Returns
    /// -------
    /// `MrioResult<IndicatorMatrix>`
    ///   Q of shape `(specs.len(), ne)`; entries outside the selected
    ///   factors are exactly zero.
    ///
    /// Errors
    /// ------
    /// - `MrioError::LabelNotFound` for an unknown sheet name.
    /// - `MrioError::RowOutOfRange` when `spec.row` exceeds the sheet.
    /// - `MrioError::DimensionMismatch` when a sheet overruns `ne`.
    /// - `MrioError::NonFiniteEntry` for NaN/±inf factors.
    /// - Catalog errors for empty or duplicate category codes.
    pub fn build(ne: usize, sheets: &[CharacterizationSheet], specs: &[IndicatorSpec]) -> MrioResult<Self> {
        let mut q = Array2::<f64>::zeros((specs.len(), ne));
        let mut labels = Vec::with_capacity(specs.len());
        for (k, spec) in specs.iter().enumerate() {
            let sheet = sheets.iter().find(|sh| sh.name == spec.sheet).ok_or_else(|| {
                MrioError::LabelNotFound { catalog: "characterization sheets".into(), code: spec.sheet.clone() }
            })?;
            if spec.row >= sheet.factors.nrows() {
                return Err(MrioError::RowOutOfRange {
                    table: sheet.name.clone(),
                    row: spec.row,
                    len: sheet.factors.nrows(),
                });
            }
            let width = sheet.factors.ncols();
            if sheet.offset + width > ne {
                return Err(MrioError::DimensionMismatch {
                    matrix: "characterization sheet",
                    expected: (sheet.factors.nrows(), ne - sheet.offset.min(ne)),
                    found: sheet.factors.dim(),
                });
            }
            let factors = sheet.factors.row(spec.row);
            let mut target = q.slice_mut(s![k, sheet.offset..sheet.offset + width]);
            for (col, (&cf, dst)) in factors.iter().zip(target.iter_mut()).enumerate() {
                if !cf.is_finite() {
                    return Err(MrioError::NonFiniteEntry { matrix: "Q", row: k, col: sheet.offset + col, value: cf });
                }
                if cf != 0.0 {
                    *dst = cf;
                }
            }
            let source = &sheet.rows[spec.row];
            let name = spec.name.clone().unwrap_or_else(|| source.name.clone());
            let unit = spec.unit.clone().or_else(|| source.unit.clone());
            labels.push(Label { code: spec.code.clone(), name, unit });
        }
        let categories = LabelCatalog::new("characterization", labels)?;
        Ok(IndicatorMatrix { categories, q })
    }
}
