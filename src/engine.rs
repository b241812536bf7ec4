//! MatrixFunctionEngine — one cache, three matrix functions.
//!
//! Purpose
//! -------
//! Give model-fitting code a single handle for `exponential`, `integrate`
//! and `logarithm` that shares one [`EigenCache`] between all three
//! solvers, configured once from [`EngineOptions`].
//!
//! Key behaviors
//! -------------
//! - Construction builds the cache from `options.cache` and
//!   `options.stability` and hands an `Arc` of it to each solver.
//! - Every method is `&self` and thread-safe; wrap the engine in an `Arc`
//!   to share it across worker threads.
//!
//! Downstream usage
//! ----------------
//! - Likelihood code typically calls [`MatrixFunctionEngine::exponential`]
//!   once per branch, or [`MatrixFunctionEngine::exponential_many`] once
//!   per generator with all branch lengths.
use crate::{
    cache::{eigen_cache::EigenCache, metrics::CacheStats},
    core::options::EngineOptions,
    errors::ExpmResult,
    exponentiation::solver::{ExponentialResult, ExponentialSolver},
    integration::solver::{IntegrationSolver, QuadratureSpec},
    logarithm::{
        solver::{LogarithmOutcome, LogarithmSolver},
        uniqueness::{GeneratorUniqueness, generator_uniqueness},
    },
};
use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;
use std::sync::Arc;

/// Facade over the exponential, integration and logarithm solvers.
#[derive(Debug, Clone)]
pub struct MatrixFunctionEngine {
    cache: Arc<EigenCache>,
    exponential: ExponentialSolver,
    integration: IntegrationSolver,
    logarithm: LogarithmSolver,
    options: EngineOptions,
}

impl MatrixFunctionEngine {
    /// Build an engine with a fresh, private cache.
    pub fn new(options: EngineOptions) -> Self {
        let cache = Arc::new(EigenCache::new(options.cache, options.stability));
        Self::with_cache(cache, options)
    }

    /// Build an engine around an existing cache.
    ///
    /// The cache keeps its own stability tolerances; `options.stability` is
    /// only used by [`MatrixFunctionEngine::generator_uniqueness`].
    pub fn with_cache(cache: Arc<EigenCache>, options: EngineOptions) -> Self {
        Self {
            exponential: ExponentialSolver::new(Arc::clone(&cache), options.expm),
            integration: IntegrationSolver::new(Arc::clone(&cache), options.expm),
            logarithm: LogarithmSolver::new(Arc::clone(&cache), options.logarithm, options.expm),
            cache,
            options,
        }
    }

    /// `exp(matrix · t)`; see [`ExponentialSolver::exponential`].
    pub fn exponential(
        &self, matrix: ArrayView2<'_, f64>, t: f64,
    ) -> ExpmResult<ExponentialResult> {
        self.exponential.exponential(matrix, t)
    }

    /// Batch form of [`MatrixFunctionEngine::exponential`].
    pub fn exponential_many(
        &self, matrix: ArrayView2<'_, f64>, times: &[f64],
    ) -> ExpmResult<Vec<ExponentialResult>> {
        self.exponential.exponential_many(matrix, times)
    }

    /// `E[exp(matrix · T)]`; see [`IntegrationSolver::integrate`].
    pub fn integrate(
        &self, matrix: ArrayView2<'_, f64>, spec: &QuadratureSpec,
    ) -> ExpmResult<ExponentialResult> {
        self.integration.integrate(matrix, spec)
    }

    /// `∫₀ᵗ exp(matrix · s) ds`; see [`IntegrationSolver::integrate_interval`].
    pub fn integrate_interval(
        &self, matrix: ArrayView2<'_, f64>, t: f64,
    ) -> ExpmResult<ExponentialResult> {
        self.integration.integrate_interval(matrix, t)
    }

    /// Principal real logarithm; see [`LogarithmSolver::logarithm`].
    pub fn logarithm(&self, matrix: ArrayView2<'_, f64>) -> ExpmResult<LogarithmOutcome> {
        self.logarithm.logarithm(matrix)
    }

    /// Principal complex logarithm; see [`LogarithmSolver::logarithm_complex`].
    pub fn logarithm_complex(
        &self, matrix: ArrayView2<'_, f64>,
    ) -> ExpmResult<Array2<Complex64>> {
        self.logarithm.logarithm_complex(matrix)
    }

    pub fn generator_uniqueness(
        &self, matrix: ArrayView2<'_, f64>,
    ) -> ExpmResult<GeneratorUniqueness> {
        generator_uniqueness(matrix, &self.options.stability)
    }

    /// Snapshot of the shared cache counters.
    pub fn cache_metrics(&self) -> CacheStats {
        self.cache.metrics()
    }

    pub fn cache(&self) -> &Arc<EigenCache> {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }
}

impl Default for MatrixFunctionEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}
