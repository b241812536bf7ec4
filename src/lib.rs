//! rust_expm — matrix exponentials and logarithms for Markov generators.
//!
//! Purpose
//! -------
//! Provide the numerical core used by likelihood code for continuous-time
//! Markov models: `exp(Q·t)` for a generator `Q`, its average over a
//! rate-heterogeneity distribution, and the logarithm that recovers `Q` from
//! a transition matrix. With the `python-bindings` feature this crate also
//! builds the `_rust_expm` extension module.
//!
//! Key behaviors
//! -------------
//! - Decompose each distinct generator once ([`cache::EigenCache`]) and
//!   reuse it across every branch length.
//! - Classify each decomposition as Stable, Degenerate or Defective
//!   ([`stability`]) and pick spectral reconstruction or Pade
//!   scaling-and-squaring accordingly ([`exponentiation`]).
//! - Integrate over rate distributions in closed form or by Gaussian
//!   quadrature ([`integration`]).
//! - Take the principal real logarithm with domain checks and
//!   re-exponentiation validation ([`logarithm`]).
//! - Bundle all of the above over one cache in [`engine::MatrixFunctionEngine`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are dense, finite, square `f64` matrices, typically 4–64 states.
//! - No global state: every cache is an explicit object owned by the caller.
//! - Numerical near-misses are absorbed by strategy fallback; only failures
//!   with no viable strategy left surface as [`errors::ExpmError`].
//!
//! Conventions
//! -----------
//! - Rows index the "from" state; generator rows sum to zero and
//!   exponentials are row-stochastic.
//! - Tolerances are explicit configuration ([`crate::core::options`]).
//! - Errors convert to Python `ValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Rust callers: `MatrixFunctionEngine::new(EngineOptions::default())` and
//!   share it behind an `Arc` across worker threads.
//! - Python callers: `_rust_expm.matrix_functions.Exponentiator`.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; end-to-end scenarios are in
//!   `tests/integration_matrix_functions.rs`.

pub mod cache;
pub mod core;
pub mod engine;
pub mod errors;
pub mod exponentiation;
pub mod integration;
pub mod logarithm;
pub mod solve;
pub mod stability;
pub mod utils;

pub use crate::engine::MatrixFunctionEngine;
pub use crate::errors::{ExpmError, ExpmResult, LogarithmAccuracyWarning};

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray2};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use std::sync::Arc;

#[cfg(feature = "python-bindings")]
use crate::{
    integration::{distributions::GammaRates, solver::QuadratureSpec},
    utils::{extract_engine_options, extract_f64_matrix},
};

/// Exponentiator — Python-facing wrapper for [`MatrixFunctionEngine`].
///
/// Purpose
/// -------
/// Expose the exponential, gamma-integrated exponential, interval integral
/// and logarithm to Python while keeping one decomposition cache per
/// instance.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `Exponentiator(cache_entries=None, row_sum_tol=None, accuracy_tol=None)`:
/// - `cache_entries`: `Option<usize>`
///   LRU bound; defaults to 128.
/// - `row_sum_tol`: `Option<f64>`
///   Row-sum tolerance for stochastic checks; defaults to `1e-8`.
/// - `accuracy_tol`: `Option<f64>`
///   Logarithm re-exponentiation warning tolerance; defaults to `1e-6`.
///   The hard limit is raised to match if `accuracy_tol` exceeds it.
///
/// Fields
/// ------
/// - `inner`: [`MatrixFunctionEngine`]
///
/// Notes
/// -----
/// - Matrices are copied out of Python before the GIL is released, so the
///   numerical work runs without holding it.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_expm.matrix_functions")]
pub struct Exponentiator {
    inner: MatrixFunctionEngine,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl Exponentiator {
    #[new]
    #[pyo3(
        signature = (cache_entries = None, row_sum_tol = None, accuracy_tol = None),
        text_signature = "(cache_entries=None, row_sum_tol=None, accuracy_tol=None)"
    )]
    pub fn new(
        cache_entries: Option<usize>, row_sum_tol: Option<f64>, accuracy_tol: Option<f64>,
    ) -> PyResult<Self> {
        let options = extract_engine_options(cache_entries, row_sum_tol, accuracy_tol)?;
        Ok(Exponentiator { inner: MatrixFunctionEngine::new(options) })
    }

    /// `exp(Q·t)` as a new 2-D array.
    #[pyo3(text_signature = "(self, q, t, /)")]
    pub fn exponential<'py>(
        &self, py: Python<'py>, q: &Bound<'py, PyAny>, t: f64,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let q = extract_f64_matrix(py, q)?.as_array().to_owned();
        let out = py.allow_threads(|| self.inner.exponential(q.view(), t))?;
        Ok(out.matrix.into_pyarray(py))
    }

    /// `E[exp(Q·T)]` for `T ~ Gamma(shape, mean / shape)`.
    #[pyo3(
        signature = (q, shape, mean = 1.0, nodes = 16),
        text_signature = "(self, q, shape, /, mean=1.0, nodes=16)"
    )]
    pub fn integrate_gamma<'py>(
        &self, py: Python<'py>, q: &Bound<'py, PyAny>, shape: f64, mean: f64, nodes: usize,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let q = extract_f64_matrix(py, q)?.as_array().to_owned();
        let spec = QuadratureSpec::auto(Arc::new(GammaRates::new(shape, mean)?), nodes)?;
        let out = py.allow_threads(|| self.inner.integrate(q.view(), &spec))?;
        Ok(out.matrix.into_pyarray(py))
    }

    /// `∫₀ᵗ exp(Q·s) ds`.
    #[pyo3(text_signature = "(self, q, t, /)")]
    pub fn integrate_interval<'py>(
        &self, py: Python<'py>, q: &Bound<'py, PyAny>, t: f64,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let q = extract_f64_matrix(py, q)?.as_array().to_owned();
        let out = py.allow_threads(|| self.inner.integrate_interval(q.view(), t))?;
        Ok(out.matrix.into_pyarray(py))
    }

    /// Principal real logarithm of `p`.
    ///
    /// Returns `(generator, residual, accurate)`; `accurate` is `False` when
    /// the re-exponentiation residual exceeds `accuracy_tol`. Residuals above
    /// the hard limit (`1e-2` by default) raise `ValueError`.
    #[pyo3(text_signature = "(self, p, /)")]
    pub fn logarithm<'py>(
        &self, py: Python<'py>, p: &Bound<'py, PyAny>,
    ) -> PyResult<(Bound<'py, PyArray2<f64>>, f64, bool)> {
        let p = extract_f64_matrix(py, p)?.as_array().to_owned();
        let out = py.allow_threads(|| self.inner.logarithm(p.view()))?;
        let accurate = out.is_accurate();
        Ok((out.generator.into_pyarray(py), out.residual, accurate))
    }

    pub fn clear_cache(&self) {
        self.inner.clear_cache();
    }

    #[getter]
    pub fn cache_len(&self) -> usize {
        self.inner.cache().len()
    }

    #[getter]
    pub fn cache_hits(&self) -> u64 {
        self.inner.cache_metrics().hits
    }

    #[getter]
    pub fn cache_misses(&self) -> u64 {
        self.inner.cache_metrics().misses
    }

    #[getter]
    pub fn decompositions(&self) -> u64 {
        self.inner.cache_metrics().decompositions
    }

    #[getter]
    pub fn evictions(&self) -> u64 {
        self.inner.cache_metrics().evictions
    }
}

/// _rust_expm — PyO3 module initializer for the Python extension.
///
/// Registers the `matrix_functions` submodule and inserts it into
/// `sys.modules` so dotted imports work.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_expm<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let matrix_functions_mod = PyModule::new(_py, "matrix_functions")?;
    matrix_functions(_py, m, &matrix_functions_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("rust_expm.matrix_functions", matrix_functions_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn matrix_functions<'py>(
    _py: Python, rust_expm: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<Exponentiator>()?;
    rust_expm.add_submodule(m)?;
    Ok(())
}
