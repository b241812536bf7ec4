//! LogarithmSolver — principal real logarithm of a transition matrix.
//!
//! Purpose
//! -------
//! Recover a rate matrix `L` with `exp(L) = P` from an (empirically
//! estimated) transition matrix `P`, as the approximate inverse of the
//! exponential for a unit time step.
//!
//! Key behaviors
//! -------------
//! - `P == I` returns the zero matrix exactly.
//! - Spectral path: eigendecompose `P` through the shared
//!   [`EigenCache`], take the principal logarithm of every eigenvalue, and
//!   reconstruct `V·diag(log λ)·V⁻¹`. Conjugate eigenvalue pairs give a real
//!   result; real eigenvalues use the real logarithm.
//! - Domain: a zero eigenvalue (`|λ| ≤ domain_tol`) or a negative real one
//!   has no real principal logarithm and yields
//!   [`ExpmError::LogarithmDomainError`]. The complex logarithm is available
//!   as an explicit opt-in through [`LogarithmSolver::logarithm_complex`].
//! - Series fallback: when the decomposition fails or is Defective and
//!   `‖P − I‖₁ < 1`, use `log P = Σ (−1)^{k+1} (P − I)^k / k`.
//! - Validation: `exp(L)` is recomputed by scaling-and-squaring. A relative
//!   Frobenius residual above `accuracy_tol` attaches a
//!   [`LogarithmAccuracyWarning`]; a residual above `max_residual`, or one
//!   that cannot be computed because `exp(L)` overflows, fails the call with
//!   [`ExpmError::LogarithmAccuracyError`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are finite and square. Stochasticity is not required; any matrix
//!   with a real principal logarithm is accepted.
//! - Warnings never replace errors: domain failures are always errors.
use crate::{
    cache::eigen_cache::EigenCache,
    core::{
        options::{ExpmOptions, LogarithmOptions},
        validation::validate_square,
    },
    errors::{ExpmError, ExpmResult, LogarithmAccuracyWarning},
    exponentiation::pade::pade_exponential,
    solve::{
        dense::{one_norm, to_array, to_dmatrix},
        eigen::Eigendecomposition,
    },
    stability::guard::StabilityVerdict,
};
use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;
use std::sync::Arc;

/// How a logarithm was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogarithmMethod {
    /// The input was exactly the identity.
    Identity,
    /// Eigenvalue-wise principal logarithm.
    Spectral,
    /// Mercator series with the given number of terms.
    Series { terms: usize },
}

/// LogarithmOutcome — real logarithm plus its validation.
///
/// Fields
/// ------
/// - `generator`: `L` with `exp(L) ≈ P`.
/// - `residual`: `‖exp(L) − P‖_F / max(1, ‖P‖_F)` (`+∞` if re-exponentiation
///   failed).
/// - `warning`: set when `accuracy_tol < residual <= max_residual`.
/// - `method`: strategy used.
#[derive(Debug, Clone, PartialEq)]
pub struct LogarithmOutcome {
    pub generator: Array2<f64>,
    pub residual: f64,
    pub warning: Option<LogarithmAccuracyWarning>,
    pub method: LogarithmMethod,
}

impl LogarithmOutcome {
    pub fn is_accurate(&self) -> bool {
        self.warning.is_none()
    }
}

/// Matrix logarithm solver sharing an [`EigenCache`].
#[derive(Debug, Clone)]
pub struct LogarithmSolver {
    cache: Arc<EigenCache>,
    options: LogarithmOptions,
    expm: ExpmOptions,
}

impl LogarithmSolver {
    /// `expm` configures the re-exponentiation used for validation.
    pub fn new(cache: Arc<EigenCache>, options: LogarithmOptions, expm: ExpmOptions) -> Self {
        Self { cache, options, expm }
    }

    pub fn options(&self) -> &LogarithmOptions {
        &self.options
    }

    /// Principal real logarithm of `matrix`.
    ///
    /// Parameters
    /// ----------
    /// - `matrix`: `ArrayView2<f64>`
    ///   Finite square matrix, typically a transition matrix `exp(Q)`.
    ///
    /// Returns
    /// -------
    /// `ExpmResult<LogarithmOutcome>`
    ///
    /// Errors
    /// ------
    /// - Validation errors for the matrix.
    /// - [`ExpmError::LogarithmDomainError`] for a zero or negative real
    ///   eigenvalue.
    /// - [`ExpmError::DecompositionError`] when the eigendecomposition is
    ///   unusable and the series fallback does not converge.
    /// - [`ExpmError::LogarithmAccuracyError`] when the re-exponentiation
    ///   residual is non-finite or exceeds `max_residual`.
    ///
    /// Examples
    /// --------
    /// ```
    /// use ndarray::Array2;
    /// use rust_expm::{
    ///     cache::EigenCache,
    ///     core::{ExpmOptions, LogarithmOptions},
    ///     logarithm::LogarithmSolver,
    /// };
    /// use std::sync::Arc;
    ///
    /// let solver = LogarithmSolver::new(
    ///     Arc::new(EigenCache::default()),
    ///     LogarithmOptions::default(),
    ///     ExpmOptions::default(),
    /// );
    /// let out = solver.logarithm(Array2::<f64>::eye(3).view()).unwrap();
    /// assert_eq!(out.generator, Array2::<f64>::zeros((3, 3)));
    /// ```
    pub fn logarithm(&self, matrix: ArrayView2<'_, f64>) -> ExpmResult<LogarithmOutcome> {
        let n = validate_square(matrix)?;
        if is_identity(matrix) {
            return Ok(LogarithmOutcome {
                generator: Array2::zeros((n, n)),
                residual: 0.0,
                warning: None,
                method: LogarithmMethod::Identity,
            });
        }

        let (generator, method) = match self.cache.get_or_compute(matrix) {
            Ok(entry) if entry.verdict() != StabilityVerdict::Defective => {
                (self.spectral_log(&entry.decomposition)?, LogarithmMethod::Spectral)
            }
            Ok(entry) => {
                log::debug!("logarithm: defective decomposition; trying series");
                let rcond = 1.0 / entry.decomposition.condition_number();
                self.series_or(matrix, "Eigendecomposition is defective.", rcond)?
            }
            Err(ExpmError::DecompositionError { reason, rcond }) => {
                log::debug!("logarithm: decomposition failed ({reason}); trying series");
                self.series_or(matrix, reason, rcond)?
            }
            Err(err) => return Err(err),
        };

        let residual = self.reexp_residual(&generator, matrix);
        let warning = self.accuracy_warning(residual)?;
        Ok(LogarithmOutcome { generator, residual, warning, method })
    }

    /// Principal complex logarithm of `matrix` (explicit opt-in).
    ///
    /// Negative real eigenvalues are accepted and mapped to `ln|λ| + iπ`;
    /// only zero eigenvalues are rejected.
    ///
    /// Errors
    /// ------
    /// - Validation errors for the matrix.
    /// - [`ExpmError::LogarithmDomainError`] for a zero eigenvalue.
    /// - [`ExpmError::DecompositionError`] for a failed or Defective
    ///   decomposition.
    pub fn logarithm_complex(
        &self, matrix: ArrayView2<'_, f64>,
    ) -> ExpmResult<Array2<Complex64>> {
        let n = validate_square(matrix)?;
        if is_identity(matrix) {
            return Ok(Array2::from_elem((n, n), Complex64::new(0.0, 0.0)));
        }
        let entry = self.cache.get_or_compute(matrix)?;
        if entry.verdict() == StabilityVerdict::Defective {
            return Err(ExpmError::DecompositionError {
                reason: "Eigendecomposition is defective.",
                rcond: 1.0 / entry.decomposition.condition_number(),
            });
        }
        let diag = entry
            .decomposition
            .values()
            .iter()
            .map(|&lambda| {
                self.check_nonzero(lambda)?;
                Ok(lambda.ln())
            })
            .collect::<ExpmResult<Vec<Complex64>>>()?;
        let full = entry.decomposition.reconstruct_diag(&diag);
        Ok(Array2::from_shape_fn((n, n), |(i, j)| full[(i, j)]))
    }

    fn check_nonzero(&self, lambda: Complex64) -> ExpmResult<()> {
        if lambda.norm() <= self.options.domain_tol {
            return Err(ExpmError::LogarithmDomainError {
                re: lambda.re,
                im: lambda.im,
                reason: "Zero eigenvalue: the matrix is singular.",
            });
        }
        Ok(())
    }

    fn spectral_log(&self, decomposition: &Eigendecomposition) -> ExpmResult<Array2<f64>> {
        let diag = decomposition
            .values()
            .iter()
            .map(|&lambda| self.principal_real_log(lambda))
            .collect::<ExpmResult<Vec<Complex64>>>()?;
        let (generator, _) = decomposition.reconstruct_diag_real(&diag);
        Ok(generator)
    }

    /// Principal logarithm of one eigenvalue, rejecting the real-log domain.
    fn principal_real_log(&self, lambda: Complex64) -> ExpmResult<Complex64> {
        self.check_nonzero(lambda)?;
        let nearly_real = lambda.im.abs() <= self.options.domain_tol * lambda.norm();
        if !nearly_real {
            return Ok(lambda.ln());
        }
        if lambda.re < 0.0 {
            return Err(ExpmError::LogarithmDomainError {
                re: lambda.re,
                im: lambda.im,
                reason: "Negative real eigenvalue has no real principal logarithm.",
            });
        }
        Ok(Complex64::new(lambda.re.ln(), 0.0))
    }

    fn series_or(
        &self, matrix: ArrayView2<'_, f64>, reason: &'static str, rcond: f64,
    ) -> ExpmResult<(Array2<f64>, LogarithmMethod)> {
        match mercator_series(&to_dmatrix(matrix), self.options.series_terms) {
            Some((log, terms)) => Ok((to_array(&log), LogarithmMethod::Series { terms })),
            None => Err(ExpmError::DecompositionError { reason, rcond }),
        }
    }

    /// Warning for a residual in `(accuracy_tol, max_residual]`, error above.
    fn accuracy_warning(&self, residual: f64) -> ExpmResult<Option<LogarithmAccuracyWarning>> {
        let max_residual = self.options.max_residual;
        if !residual.is_finite() || residual > max_residual {
            return Err(ExpmError::LogarithmAccuracyError { residual, max_residual });
        }
        if residual <= self.options.accuracy_tol {
            return Ok(None);
        }
        let w = LogarithmAccuracyWarning { residual, tolerance: self.options.accuracy_tol };
        log::warn!("logarithm: {w}");
        Ok(Some(w))
    }

    fn reexp_residual(&self, generator: &Array2<f64>, target: ArrayView2<'_, f64>) -> f64 {
        let Ok(outcome) = pade_exponential(&to_dmatrix(generator.view()), &self.expm, false) else {
            return f64::INFINITY;
        };
        let target = to_dmatrix(target);
        (&outcome.matrix - &target).norm() / target.norm().max(1.0)
    }
}

/// Exact identity test; no tolerance.
fn is_identity(matrix: ArrayView2<'_, f64>) -> bool {
    matrix.indexed_iter().all(|((i, j), &v)| if i == j { v == 1.0 } else { v == 0.0 })
}

/// `log P = Σ_{k≥1} (−1)^{k+1} (P − I)^k / k`, or `None` when
/// `‖P − I‖₁ ≥ 1` or the series has not converged within `max_terms`.
fn mercator_series(p: &DMatrix<f64>, max_terms: usize) -> Option<(DMatrix<f64>, usize)> {
    let n = p.nrows();
    let x = p - DMatrix::<f64>::identity(n, n);
    if one_norm(&x) >= 1.0 {
        return None;
    }
    let mut power = x.clone();
    let mut sum = x.clone();
    for k in 2..=max_terms {
        power = &power * &x;
        let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
        let term = &power * (sign / k as f64);
        sum += &term;
        if one_norm(&term) <= f64::EPSILON * one_norm(&sum).max(1.0) {
            return Some((sum, k));
        }
    }
    None
}
