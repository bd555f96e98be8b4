//! Cell overrides and the functions applying them.
//!
//! Each override addresses its cell by catalog codes, never by flat index:
//! sectors are `(region, sector)` pairs and impact categories are codes or
//! display names. Applying a list of overrides returns a new matrix; the
//! input is never modified.
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{
    background::stimulus::{StimulusColumn, StimulusMatrix},
    mrio::{
        errors::{MrioError, MrioResult},
        labels::LabelSet,
    },
};

/// `(region, sector)` catalog codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectorKey {
    pub region: String,
    pub sector: String,
}

impl SectorKey {
    pub fn new(region: impl Into<String>, sector: impl Into<String>) -> Self {
        SectorKey { region: region.into(), sector: sector.into() }
    }

    fn index(&self, labels: &LabelSet) -> MrioResult<usize> {
        labels.sector_index(&self.region, &self.sector)
    }
}

/// New technical coefficient `A[input, output]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientOverride {
    pub input: SectorKey,
    pub output: SectorKey,
    pub value: f64,
}

/// New per-unit-output impact `B[category, sector]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityOverride {
    pub category: String,
    pub sector: SectorKey,
    pub value: f64,
}

/// New stimulus demand on `sector` in one component column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusOverride {
    pub sector: SectorKey,
    pub column: StimulusColumn,
    pub value: f64,
}

fn checked(matrix: &'static str, row: usize, col: usize, value: f64) -> MrioResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MrioError::NonFiniteEntry { matrix, row, col, value })
    }
}

/// Copy of `a` with the overrides applied in order.
///
/// The result still needs a fresh Leontief solve; negative or unstable
/// coefficients are rejected there.
///
/// Errors
/// ------
/// - `MrioError::LabelNotFound` for unknown region or sector codes.
/// - `MrioError::NonFiniteEntry` for a NaN/±inf value.
/// - `MrioError::DimensionMismatch` when `a` does not match `labels`.
pub fn adapt_coefficients(
    labels: &LabelSet, a: &Array2<f64>, overrides: &[CoefficientOverride],
) -> MrioResult<Array2<f64>> {
    let n = labels.n_sectors();
    if a.dim() != (n, n) {
        return Err(MrioError::DimensionMismatch { matrix: "A", expected: (n, n), found: a.dim() });
    }
    let mut out = a.clone();
    for o in overrides {
        let (i, j) = (o.input.index(labels)?, o.output.index(labels)?);
        out[[i, j]] = checked("A", i, j, o.value)?;
    }
    Ok(out)
}

/// Copy of `b` with the overrides applied in order.
///
/// Categories resolve against `labels.characterization` by code, then by
/// name.
///
/// Errors
/// ------
/// - `MrioError::LabelNotFound` for unknown categories or sectors.
/// - `MrioError::NonFiniteEntry` for a NaN/±inf value.
/// - `MrioError::DimensionMismatch` when `b` does not match `labels`.
pub fn adapt_intensities(
    labels: &LabelSet, b: &Array2<f64>, overrides: &[IntensityOverride],
) -> MrioResult<Array2<f64>> {
    let shape = (labels.nq(), labels.n_sectors());
    if b.dim() != shape {
        return Err(MrioError::DimensionMismatch { matrix: "B", expected: shape, found: b.dim() });
    }
    let mut out = b.clone();
    for o in overrides {
        let q = labels.characterization.position_by_code_or_name(&o.category)?;
        let j = o.sector.index(labels)?;
        out[[q, j]] = checked("B", q, j, o.value)?;
    }
    Ok(out)
}

/// Copy of the stimulus demand with the overrides applied in order and the
/// total column recomputed.
///
/// Errors
/// ------
/// - `MrioError::DerivedOverride` when an override targets the total.
/// - `MrioError::LabelNotFound` for unknown region or sector codes.
/// - `MrioError::NonFiniteEntry` for a NaN/±inf value.
pub fn adapt_stimulus(
    labels: &LabelSet, y: &StimulusMatrix, overrides: &[StimulusOverride],
) -> MrioResult<StimulusMatrix> {
    let mut out = y.clone();
    for o in overrides {
        out.set_entry(o.sector.index(labels)?, o.column, o.value)?;
    }
    Ok(out)
}
