//! ExponentialSolver — `exp(Q·t)` with cache-backed strategy selection.
//!
//! Purpose
//! -------
//! Evaluate the matrix exponential of a generator at many time scalars while
//! paying for one eigendecomposition per distinct matrix. The cached
//! [`StabilityVerdict`] selects the strategy:
//!
//! | verdict / outcome       | strategy                                          |
//! |-------------------------|---------------------------------------------------|
//! | `t == 0`                | exact identity                                    |
//! | Stable                  | `I + V·diag(exp(λt) − 1)·V⁻¹`; Pade if not finite |
//! | Degenerate              | spectral, then independent check; Pade on failure |
//! | Defective               | Pade scaling-and-squaring                         |
//! | `DecompositionError`    | Pade scaling-and-squaring                         |
//!
//! Key behaviors
//! -------------
//! - Near-misses never reach the caller: a Degenerate result that fails its
//!   check silently falls back to Pade, and so does any spectral result that
//!   overflowed or kept a non-negligible imaginary part. Pade then either
//!   succeeds or reports the overflow as an error.
//! - Only [`ExpmError::ExponentiationError`] (all Pade attempts failed) and
//!   input validation errors are surfaced.
//! - [`ExponentialSolver::exponential_many`] evaluates many times against
//!   one decomposition in parallel with `rayon`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The solver never mutates its inputs; the shared cache is its only state.
//! - Results approximate a stochastic matrix for generator inputs and
//!   `t ≥ 0`; this is checked where the strategy calls for it, not enforced.
use crate::{
    cache::eigen_cache::{CachedDecomposition, EigenCache},
    core::{
        generator::is_valid_generator,
        options::ExpmOptions,
        validation::{validate_square, validate_time},
    },
    errors::{ExpmError, ExpmResult},
    exponentiation::{
        pade::pade_exponential,
        spectral::{
            exponential_reference, is_finite_and_real, passes_independent_check,
            spectral_exponential,
        },
    },
    solve::dense::{to_array, to_dmatrix},
    stability::guard::StabilityVerdict,
};
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;
use std::sync::Arc;

/// How an [`ExponentialResult`] (or an integral built from them) was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMethod {
    /// `t == 0`; the identity was returned exactly.
    Identity,
    /// Spectral reconstruction from a Stable decomposition.
    Spectral,
    /// Spectral reconstruction from a Degenerate decomposition that passed
    /// the independent check.
    ValidatedSpectral,
    /// Scaling-and-squaring Pade with the given number of squarings.
    Pade { squarings: u32 },
    /// Per-eigenvalue closed-form integral.
    ClosedForm,
    /// Weighted sum of exponentials over a quadrature rule.
    Quadrature { nodes: usize },
    /// Block-matrix exponential (Van Loan) for interval integrals.
    VanLoan,
}

/// A dense result matrix together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialResult {
    pub matrix: Array2<f64>,
    pub method: SolveMethod,
}

impl ExponentialResult {
    pub fn into_matrix(self) -> Array2<f64> {
        self.matrix
    }
}

/// Matrix exponential solver sharing an [`EigenCache`].
#[derive(Debug, Clone)]
pub struct ExponentialSolver {
    cache: Arc<EigenCache>,
    options: ExpmOptions,
}

impl ExponentialSolver {
    pub fn new(cache: Arc<EigenCache>, options: ExpmOptions) -> Self {
        Self { cache, options }
    }

    pub fn cache(&self) -> &Arc<EigenCache> {
        &self.cache
    }

    pub fn options(&self) -> &ExpmOptions {
        &self.options
    }

    /// Compute `exp(matrix · t)`.
    ///
    /// Parameters
    /// ----------
    /// - `matrix`: `ArrayView2<f64>`
    ///   Finite square matrix, typically a generator.
    /// - `t`: `f64`
    ///   Finite time scalar (branch length), usually `≥ 0`.
    ///
    /// Returns
    /// -------
    /// `ExpmResult<ExponentialResult>`
    ///
    /// Errors
    /// ------
    /// - Validation errors for empty, non-square, or non-finite input.
    /// - [`ExpmError::ExponentiationError`] when the Pade fallback fails.
    ///
    /// Examples
    /// --------
    /// ```
    /// use ndarray::array;
    /// use rust_expm::{cache::EigenCache, core::ExpmOptions, exponentiation::ExponentialSolver};
    /// use std::sync::Arc;
    ///
    /// let solver = ExponentialSolver::new(Arc::new(EigenCache::default()), ExpmOptions::default());
    /// let q = array![[-1.0, 1.0], [1.0, -1.0]];
    /// let p = solver.exponential(q.view(), 1.0).unwrap().matrix;
    /// assert!((p[[0, 0]] - 0.5 * (1.0 + (-2.0_f64).exp())).abs() < 1e-12);
    /// ```
    pub fn exponential(
        &self, matrix: ArrayView2<'_, f64>, t: f64,
    ) -> ExpmResult<ExponentialResult> {
        let n = validate_square(matrix)?;
        validate_time(t)?;
        if t == 0.0 {
            return Ok(identity_result(n));
        }
        let cached = self.lookup(matrix)?;
        self.exponential_with(matrix, cached.as_deref(), t)
    }

    /// Compute `exp(matrix · t)` by scaling-and-squaring only, bypassing the
    /// cache.
    ///
    /// # Errors
    /// Same as [`ExponentialSolver::exponential`].
    pub fn exponential_pade(
        &self, matrix: ArrayView2<'_, f64>, t: f64,
    ) -> ExpmResult<ExponentialResult> {
        let n = validate_square(matrix)?;
        validate_time(t)?;
        if t == 0.0 {
            return Ok(identity_result(n));
        }
        self.pade(matrix, t)
    }

    /// Evaluate `exp(matrix · t)` for every `t` in `times`, in parallel.
    ///
    /// The decomposition is fetched once; results are returned in the order
    /// of `times`.
    ///
    /// # Errors
    /// The first error encountered (validation or exponentiation).
    pub fn exponential_many(
        &self, matrix: ArrayView2<'_, f64>, times: &[f64],
    ) -> ExpmResult<Vec<ExponentialResult>> {
        let n = validate_square(matrix)?;
        for &t in times {
            validate_time(t)?;
        }
        if times.iter().all(|&t| t == 0.0) {
            return Ok(times.iter().map(|_| identity_result(n)).collect());
        }
        let cached = self.lookup(matrix)?;
        times
            .par_iter()
            .map(|&t| {
                if t == 0.0 {
                    return Ok(identity_result(n));
                }
                self.exponential_with(matrix, cached.as_deref(), t)
            })
            .collect()
    }

    /// Cache lookup that turns a decomposition failure into "no decomposition".
    pub(crate) fn lookup(
        &self, matrix: ArrayView2<'_, f64>,
    ) -> ExpmResult<Option<Arc<CachedDecomposition>>> {
        match self.cache.get_or_compute(matrix) {
            Ok(entry) => Ok(Some(entry)),
            Err(ExpmError::DecompositionError { reason, rcond }) => {
                log::debug!("exponential: decomposition failed ({reason}, rcond {rcond:e}); using Pade");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Strategy dispatch for a validated, non-zero `t`.
    pub(crate) fn exponential_with(
        &self, matrix: ArrayView2<'_, f64>, cached: Option<&CachedDecomposition>, t: f64,
    ) -> ExpmResult<ExponentialResult> {
        let Some(entry) = cached else {
            return self.pade(matrix, t);
        };
        match entry.verdict() {
            StabilityVerdict::Stable => {
                let (p, imag) = spectral_exponential(&entry.decomposition, t);
                if is_finite_and_real(&p, imag, self.options.row_sum_tol) {
                    return Ok(ExponentialResult { matrix: p, method: SolveMethod::Spectral });
                }
                log::debug!("exponential: spectral result overflowed at t = {t}; using Pade");
                self.pade(matrix, t)
            }
            StabilityVerdict::Degenerate => {
                let (p, imag) = spectral_exponential(&entry.decomposition, t);
                let tol = self.options.row_sum_tol;
                let reference = exponential_reference(&entry.decomposition, t);
                if passes_independent_check(&entry.decomposition, &p, imag, &reference, tol) {
                    return Ok(ExponentialResult {
                        matrix: p,
                        method: SolveMethod::ValidatedSpectral,
                    });
                }
                log::debug!("exponential: degenerate result rejected at t = {t}; using Pade");
                self.pade(matrix, t)
            }
            StabilityVerdict::Defective => self.pade(matrix, t),
        }
    }

    fn pade(&self, matrix: ArrayView2<'_, f64>, t: f64) -> ExpmResult<ExponentialResult> {
        let stochastic = is_valid_generator(matrix, self.options.row_sum_tol) && t > 0.0;
        let scaled = to_dmatrix(matrix) * t;
        let outcome = pade_exponential(&scaled, &self.options, stochastic)?;
        Ok(ExponentialResult {
            matrix: to_array(&outcome.matrix),
            method: SolveMethod::Pade { squarings: outcome.squarings },
        })
    }
}

fn identity_result(n: usize) -> ExponentialResult {
    ExponentialResult { matrix: Array2::eye(n), method: SolveMethod::Identity }
}
