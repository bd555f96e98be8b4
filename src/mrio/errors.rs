//! Errors for MRIO assembly, Leontief solves, footprints, and scenarios.
//!
//! This module defines [`MrioError`], the single error type shared by the
//! label catalogs, coefficient assembly, the Leontief solver, the stimulus
//! builder, the footprint engine, the scenario adapter, and artifact
//! persistence. It implements `Display`/`Error` and, when the
//! `python-bindings` feature is enabled, converts to `PyErr`.
//!
//! ## Conventions
//! - **Indices are 0-based** and refer to the flat region×sector (or
//!   region×final-demand) layout of the catalogs.
//! - Variants fall into three families: *data validation* (shapes,
//!   catalogs, spectral radius, zero normalization bases), *lookup*
//!   (unknown codes), and *persistence*. All are fatal to the stage that
//!   raised them; numerical edge cases that are recovered locally (zero
//!   output) never surface here.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Crate-wide result alias for MRIO operations that may produce [`MrioError`].
pub type MrioResult<T> = Result<T, MrioError>;

/// Unified error type for the background and footprint pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum MrioError {
    // ---- Label catalogs ----
    /// Catalog has no entries.
    EmptyCatalog { catalog: String },

    /// The same code appears twice in one catalog.
    DuplicateLabel { catalog: String, code: String },

    /// Requested code is not part of the catalog.
    LabelNotFound { catalog: String, code: String },

    /// Observed code order disagrees with the catalog order.
    LabelOrderMismatch { catalog: String, position: usize, expected: String, found: String },

    /// Reindexing order is not a permutation of the catalog.
    InvalidPermutation { catalog: String, expected: usize, found: usize },

    // ---- Shapes and values ----
    /// Matrix shape disagrees with the catalog sizes.
    DimensionMismatch { matrix: &'static str, expected: (usize, usize), found: (usize, usize) },

    /// Matrix contains NaN/±inf.
    NonFiniteEntry { matrix: &'static str, row: usize, col: usize, value: f64 },

    /// Technical coefficient is negative beyond numerical noise.
    NegativeCoefficient { row: usize, col: usize, value: f64 },

    /// Selected row does not exist in a characterization sheet.
    RowOutOfRange { table: String, row: usize, len: usize },

    // ---- Leontief system ----
    /// Dominant eigenvalue of A is (estimated) ≥ 1.
    SpectralRadius { estimate: f64 },

    /// LU decomposition of (I − A) failed.
    SingularSystem,

    /// Stored inverse does not belong to the stored coefficient matrix.
    StaleLeontief { residual: f64 },

    // ---- Stimulus ----
    /// Allocation base sums to zero, so the import shares are undefined.
    ZeroAllocationBase { category: String },

    /// A scale or conversion factor is zero, negative, or non-finite.
    InvalidFactor { name: String, value: f64 },

    // ---- Scenarios ----
    /// Override targets a derived quantity.
    DerivedOverride { target: String },

    // ---- Persistence ----
    /// Reading or writing an artifact failed.
    Persistence { path: String, text: String },
}

impl std::error::Error for MrioError {}

impl std::fmt::Display for MrioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Label catalogs ----
            MrioError::EmptyCatalog { catalog } => {
                write!(f, "Label catalog '{catalog}' must not be empty.")
            }
            MrioError::DuplicateLabel { catalog, code } => {
                write!(f, "Label catalog '{catalog}' contains code '{code}' more than once.")
            }
            MrioError::LabelNotFound { catalog, code } => {
                write!(f, "Code '{code}' not found in label catalog '{catalog}'.")
            }
            MrioError::LabelOrderMismatch { catalog, position, expected, found } => {
                write!(
                    f,
                    "Label catalog '{catalog}' out of order at position {position}: expected '{expected}', found '{found}'."
                )
            }
            MrioError::InvalidPermutation { catalog, expected, found } => {
                write!(
                    f,
                    "Reindexing '{catalog}' requires a permutation of {expected} codes, got {found} distinct known codes."
                )
            }
            // ---- Shapes and values ----
            MrioError::DimensionMismatch { matrix, expected, found } => {
                write!(
                    f,
                    "Matrix {matrix} has shape {}x{}, expected {}x{}.",
                    found.0, found.1, expected.0, expected.1
                )
            }
            MrioError::NonFiniteEntry { matrix, row, col, value } => {
                write!(f, "Matrix {matrix} has non-finite entry {value} at ({row}, {col}).")
            }
            MrioError::NegativeCoefficient { row, col, value } => {
                write!(f, "Technical coefficient at ({row}, {col}) is negative: {value}.")
            }
            MrioError::RowOutOfRange { table, row, len } => {
                write!(f, "Row {row} is out of range for '{table}' with {len} rows.")
            }
            // ---- Leontief system ----
            MrioError::SpectralRadius { estimate } => {
                write!(
                    f,
                    "Spectral radius of A is estimated at {estimate} (must be < 1); the coefficient data is malformed."
                )
            }
            MrioError::SingularSystem => {
                write!(f, "The system (I - A) is singular and cannot be inverted.")
            }
            MrioError::StaleLeontief { residual } => {
                write!(
                    f,
                    "Leontief inverse does not match the coefficient matrix (residual {residual})."
                )
            }
            // ---- Stimulus ----
            MrioError::ZeroAllocationBase { category } => {
                write!(
                    f,
                    "Existing consumption of '{category}' sums to zero; import allocation is undefined."
                )
            }
            MrioError::InvalidFactor { name, value } => {
                write!(f, "Factor '{name}' must be finite and > 0, got {value}.")
            }
            // ---- Scenarios ----
            MrioError::DerivedOverride { target } => {
                write!(f, "'{target}' is derived and cannot be overridden directly.")
            }
            // ---- Persistence ----
            MrioError::Persistence { path, text } => {
                write!(f, "Artifact I/O failed for {path}: {text}")
            }
        }
    }
}

/// Convert an [`MrioError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl From<MrioError> for PyErr {
    fn from(err: MrioError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `Display` formatting for representative variants of each family.
    //
    // They intentionally DO NOT cover:
    // - The `From<MrioError> for PyErr` conversion, which needs the Python
    //   C API and belongs to Python-level tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that lookup errors name both the catalog and the missing code.
    //
    // Given
    // -----
    // - `LabelNotFound` for code "XX" in catalog "region".
    //
    // Expect
    // ------
    // - The message contains "XX" and "region".
    fn label_not_found_message_names_catalog_and_code() {
        let err = MrioError::LabelNotFound { catalog: "region".into(), code: "XX".into() };

        let msg = err.to_string();

        assert!(msg.contains("XX"));
        assert!(msg.contains("region"));
    }

    #[test]
    // Purpose
    // -------
    // Verify that dimension mismatches report found and expected shapes.
    //
    // Given
    // -----
    // - `DimensionMismatch` for matrix "A" expected 4x4, found 3x4.
    //
    // Expect
    // ------
    // - The message contains "3x4" and "4x4".
    fn dimension_mismatch_message_reports_both_shapes() {
        let err = MrioError::DimensionMismatch { matrix: "A", expected: (4, 4), found: (3, 4) };

        let msg = err.to_string();

        assert!(msg.contains("3x4"));
        assert!(msg.contains("4x4"));
    }

    #[test]
    // Purpose
    // -------
    // Verify that the spectral radius error embeds the estimate.
    //
    // Given
    // -----
    // - `SpectralRadius { estimate: 1.1 }`.
    //
    // Expect
    // ------
    // - The message contains "1.1".
    fn spectral_radius_message_embeds_estimate() {
        let err = MrioError::SpectralRadius { estimate: 1.1 };

        assert!(err.to_string().contains("1.1"));
    }
}
