//! Python conversion helpers for the `python-bindings` feature.
#[cfg(feature = "python-bindings")]
use ndarray::Array2;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::core::options::{CacheOptions, EngineOptions, ExpmOptions, LogarithmOptions};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Array2 → PyArray2
    PyArrayMethods, // .readonly()
    PyReadonlyArray2,
};

/// Accept a 2-D `numpy.ndarray`, a pandas `DataFrame`, or a nested sequence
/// of floats as a read-only `f64` matrix.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray2<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro);
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro);
        }
    }

    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err(
            "expected a 2-D numpy.ndarray, pandas.DataFrame, or nested sequence of float64",
        )
    })?;
    Ok(rows_to_array(rows)?.into_pyarray(py).readonly())
}

#[cfg(feature = "python-bindings")]
fn rows_to_array(rows: Vec<Vec<f64>>) -> PyResult<Array2<f64>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != n_cols) {
        return Err(PyTypeError::new_err("matrix rows must all have the same length"));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| PyTypeError::new_err(format!("invalid matrix shape: {e}")))
}

/// Build [`EngineOptions`] from optional Python keyword arguments, keeping
/// the defaults for anything left as `None`.
#[cfg(feature = "python-bindings")]
pub fn extract_engine_options(
    cache_entries: Option<usize>, row_sum_tol: Option<f64>, accuracy_tol: Option<f64>,
) -> PyResult<EngineOptions> {
    let mut options = EngineOptions::default();
    if let Some(entries) = cache_entries {
        options.cache = CacheOptions::new(entries)?;
    }
    if let Some(tol) = row_sum_tol {
        let d = options.expm;
        options.expm = ExpmOptions::new(tol, d.max_refinements, d.max_squarings)?;
    }
    if let Some(tol) = accuracy_tol {
        let d = options.logarithm;
        let max_residual = d.max_residual.max(tol);
        options.logarithm = LogarithmOptions::new(d.domain_tol, tol, max_residual, d.series_terms)?;
    }
    Ok(options)
}
