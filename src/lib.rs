//! health_footprint — environmental footprints of national healthcare
//! consumption from a multi-regional input-output (MRIO) model.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and, behind the
//! `python-bindings` feature, as the PyO3 bridge exposing the Leontief solve
//! and the footprint decompositions to Python via the `_health_footprint`
//! extension module.
//!
//! Key behaviors
//! -------------
//! - [`mrio`]: label catalogs, characterization, coefficient assembly, the
//!   Leontief system, the waste extension and reporting aggregations.
//! - [`statistics`]: paginated national statistics and the national
//!   accounts feeding the stimulus.
//! - [`background`]: the healthcare stimulus and the per-year background
//!   record.
//! - [`footprint`]: hotspot and contribution decompositions, labelled
//!   tables, report breakdowns.
//! - [`scenario`]: counterfactual overrides of A, B and the stimulus.
//! - [`store`], [`config`], [`pipeline`]: persisted artifacts, explicit
//!   configuration, and the staged pipeline tying everything together.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every matrix is indexed by catalog order; flat sector indices are
//!   region-major (`region * ns + sector`).
//! - `L` is always carried with the `A` it was solved from.
//! - Library code never installs a logger; it emits through the `log`
//!   facade.
//!
//! Conventions
//! -----------
//! - Monetary flows are in million euro; characterized impacts leave the
//!   background in kt (CO2-eq for global warming).
//! - Errors are rich enums internally ([`mrio::MrioError`],
//!   [`statistics::StatsError`], [`pipeline::PipelineError`]) and become
//!   `ValueError` at the PyO3 boundary.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to the code on small hand-computed economies; an
//!   end-to-end test under `tests/` runs every stage through a temporary
//!   store.

pub mod background;
pub mod config;
pub mod footprint;
pub mod mrio;
pub mod pipeline;
pub mod scenario;
pub mod statistics;
pub mod store;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray2};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{footprint::decomposition, mrio::leontief::LeontiefSystem, utils::extract_f64_matrix};

/// Leontief inverse `(I − A)⁻¹` of a technical coefficient matrix.
///
/// Raises `ValueError` for non-square, non-finite or negative inputs, a
/// spectral radius of `|A|` not below one, or a singular `I − A`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(a, /)")]
fn leontief_inverse<'py>(py: Python<'py>, a: &Bound<'py, PyAny>) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let a = extract_f64_matrix(a)?;
    let (_, l) = py.allow_threads(|| LeontiefSystem::solve(a))?.into_parts();
    Ok(l.into_pyarray(py))
}

/// Production-side decomposition: one `(n × nq)` array per column of `y`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(b, l, y, /)")]
fn hotspot<'py>(
    py: Python<'py>, b: &Bound<'py, PyAny>, l: &Bound<'py, PyAny>, y: &Bound<'py, PyAny>,
) -> PyResult<Vec<Bound<'py, PyArray2<f64>>>> {
    let (b, l, y) = (extract_f64_matrix(b)?, extract_f64_matrix(l)?, extract_f64_matrix(y)?);
    let out = py.allow_threads(|| decomposition::hotspot(&b, &l, &y))?;
    Ok(out.into_iter().map(|m| m.into_pyarray(py)).collect())
}

/// Consumption-side decomposition: one `(n × nq)` array per column of `y`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(b, l, y, /)")]
fn contribution<'py>(
    py: Python<'py>, b: &Bound<'py, PyAny>, l: &Bound<'py, PyAny>, y: &Bound<'py, PyAny>,
) -> PyResult<Vec<Bound<'py, PyArray2<f64>>>> {
    let (b, l, y) = (extract_f64_matrix(b)?, extract_f64_matrix(l)?, extract_f64_matrix(y)?);
    let out = py.allow_threads(|| decomposition::contribution(&b, &l, &y))?;
    Ok(out.into_iter().map(|m| m.into_pyarray(py)).collect())
}

#[cfg(feature = "python-bindings")]
#[pymodule]
fn _health_footprint<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(leontief_inverse, m)?)?;
    m.add_function(wrap_pyfunction!(hotspot, m)?)?;
    m.add_function(wrap_pyfunction!(contribution, m)?)?;
    Ok(())
}
