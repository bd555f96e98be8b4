//! Errors for national statistics retrieval and selection.
//!
//! [`StatsError`] covers the remote table fetch (transport, malformed
//! pages, page bound), the selection of single observations, and the
//! derivation of price-basis conversion factors and expenditure totals.
//! Transport failures are the only retryable family; everything else is a
//! data-validation or lookup error.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type StatsResult<T> = Result<T, StatsError>;

#[derive(Debug, Clone, PartialEq)]
pub enum StatsError {
    // ---- Fetching ----
    /// The page source failed to deliver a page.
    Transport { url: String, text: String },

    /// A page arrived but does not have the expected layout.
    MalformedResponse { url: String, text: String },

    /// Pagination did not terminate within the configured bound.
    PageLimitExceeded { url: String, max_pages: usize },

    /// Fetch policy bound is zero.
    InvalidPolicy { field: &'static str },

    // ---- Selection ----
    /// No observation matches the filters.
    ObservationNotFound { filters: String },

    /// More than one observation matches the filters.
    AmbiguousObservation { filters: String, count: usize },

    /// The matching observation carries no value.
    MissingValue { filters: String },

    // ---- Tables ----
    /// A product or expenditure key is not in the table.
    KeyNotFound { table: &'static str, key: String },

    /// Table columns have different lengths.
    LengthMismatch { table: &'static str, expected: usize, found: usize },

    /// Basic/total supply ratio is undefined or not a valid factor.
    InvalidConversion { product: String, basic: f64, total: f64 },
}

impl From<anyhow::Error> for StatsError {
    fn from(err: anyhow::Error) -> Self {
        StatsError::Transport { url: String::new(), text: err.to_string() }
    }
}

impl std::error::Error for StatsError {}

impl std::fmt::Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Fetching ----
            StatsError::Transport { url, text } => {
                write!(f, "Statistics Error: fetching '{url}' failed: {text}")
            }
            StatsError::MalformedResponse { url, text } => {
                write!(f, "Statistics Error: malformed page from '{url}': {text}")
            }
            StatsError::PageLimitExceeded { url, max_pages } => {
                write!(f, "Statistics Error: '{url}' still paginating after {max_pages} pages")
            }
            StatsError::InvalidPolicy { field } => {
                write!(f, "Statistics Error: fetch policy field '{field}' must be > 0")
            }
            // ---- Selection ----
            StatsError::ObservationNotFound { filters } => {
                write!(f, "Statistics Error: no observation matches {filters}")
            }
            StatsError::AmbiguousObservation { filters, count } => {
                write!(f, "Statistics Error: {count} observations match {filters}, expected exactly one")
            }
            StatsError::MissingValue { filters } => {
                write!(f, "Statistics Error: observation matching {filters} has no value")
            }
            // ---- Tables ----
            StatsError::KeyNotFound { table, key } => {
                write!(f, "Statistics Error: key '{key}' not found in {table}")
            }
            StatsError::LengthMismatch { table, expected, found } => {
                write!(f, "Statistics Error: {table} column has length {found}, expected {expected}")
            }
            StatsError::InvalidConversion { product, basic, total } => {
                write!(
                    f,
                    "Statistics Error: conversion for '{product}' undefined (basic {basic}, total {total})"
                )
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<StatsError> for PyErr {
    fn from(err: StatsError) -> PyErr {
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
    // - `Display` for selection errors.
    // - Conversion from `anyhow::Error` into a transport failure.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that ambiguity errors report the match count and filters.
    //
    // Given
    // -----
    // - `AmbiguousObservation` with 2 matches.
    //
    // Expect
    // ------
    // - The message contains "2" and the filter text.
    fn ambiguous_message_reports_count_and_filters() {
        let err = StatsError::AmbiguousObservation { filters: "Perioden=2016JJ00".into(), count: 2 };

        let msg = err.to_string();

        assert!(msg.contains("2 observations"));
        assert!(msg.contains("Perioden=2016JJ00"));
    }

    #[test]
    // Purpose
    // -------
    // Ensure caller transport errors become `Transport`.
    //
    // Given
    // -----
    // - `anyhow!("connection reset")`.
    //
    // Expect
    // ------
    // - `Transport` carrying the original text.
    fn anyhow_errors_map_to_transport() {
        let err: StatsError = anyhow::anyhow!("connection reset").into();

        assert_eq!(err, StatsError::Transport { url: String::new(), text: "connection reset".into() });
    }
}
