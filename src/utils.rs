//! Conversion helpers for the Python bindings.
//!
//! Accept 2-D `float64` inputs as `numpy.ndarray`, as pandas `DataFrame`
//! (through `to_numpy`), or as a list of equal-length rows, and return owned
//! `ndarray` matrices for the Rust core.
#[cfg(feature = "python-bindings")]
use ndarray::Array2;

#[cfg(feature = "python-bindings")]
use numpy::PyReadonlyArray2;

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::PyAny,
};

/// Copy a 2-D array-like into an owned `Array2<f64>`.
///
/// Errors
/// ------
/// - `TypeError` when the input is neither array-like nor a list of rows.
/// - `ValueError` for ragged rows.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(raw_data: &Bound<'py, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr.as_array().to_owned());
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(arr) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(arr.as_array().to_owned());
        }
    }

    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 2-D numpy.ndarray, pandas.DataFrame, or list of float64 rows")
    })?;
    let ncols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != ncols) {
        return Err(PyValueError::new_err("rows must all have the same length"));
    }
    let nrows = rows.len();
    Array2::from_shape_vec((nrows, ncols), rows.into_iter().flatten().collect())
        .map_err(|e| PyValueError::new_err(e.to_string()))
}
