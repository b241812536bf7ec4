//! Solver options — explicit tolerances, refinement caps, and cache bounds.
//!
//! Purpose
//! -------
//! Collect every numeric "near enough" decision made by the solvers into
//! validated option structs built once at construction time. Nothing in the
//! crate reads global configuration; each engine or test builds its own
//! options and passes them down explicitly.
//!
//! Key behaviors
//! -------------
//! - [`StabilityTolerances`] drives eigendecomposition clustering and the
//!   Stable / Degenerate / Defective classification.
//! - [`ExpmOptions`] bounds the Pade refinement loop and sets the row-sum
//!   tolerance used by the independent result check.
//! - [`LogarithmOptions`] sets the domain tolerance, the warning threshold
//!   and the hard residual limit of the logarithm.
//! - [`CacheOptions`] bounds the eigendecomposition cache.
//! - [`EngineOptions`] bundles all of the above for
//!   [`MatrixFunctionEngine`](crate::engine::MatrixFunctionEngine).
//!
//! Invariants & assumptions
//! ------------------------
//! - All tolerances are finite and strictly positive.
//! - `stable_residual <= max_residual` and
//!   `stable_condition <= max_condition`.
//! - `accuracy_tol <= LogarithmOptions::max_residual`.
//! - `max_entries >= 1`.
//!
//! Conventions
//! -----------
//! - Residuals and eigen-gaps are relative: they are divided by `‖A‖_F`
//!   (or the spectral radius for gaps) before comparison, with no floor, so
//!   the same tolerances apply to fast and very slow generators.
//! - Constructors validate and return [`ExpmResult`]; `Default`
//!   implementations use values that pass the same validation.
//!
//! Testing notes
//! -------------
//! - Unit tests verify that defaults validate, that invalid tolerances and
//!   orderings are rejected, and that a zero cache bound is rejected.
use crate::{
    core::validation::verify_tolerance,
    errors::{ExpmError, ExpmResult},
};

/// Default number of cached eigendecompositions.
pub const DEFAULT_CACHE_ENTRIES: usize = 128;

/// StabilityTolerances — thresholds for trusting an eigendecomposition.
///
/// Purpose
/// -------
/// Decide when the spectral reconstruction `V·diag(f(λ))·V⁻¹` can be used
/// directly, when it needs an independent check, and when it must be
/// abandoned in favour of scaling-and-squaring.
///
/// Fields
/// ------
/// - `stable_residual`: relative reconstruction residual at or below which a
///   decomposition may be classified Stable.
/// - `max_residual`: relative residual above which the decomposition is
///   Defective.
/// - `min_eigen_gap`: relative smallest pairwise eigenvalue distance required
///   for Stable.
/// - `stable_condition`: eigenvector condition number at or below which a
///   decomposition may be classified Stable.
/// - `max_condition`: condition number above which the decomposition is
///   Defective.
/// - `cluster_tol`: relative distance under which eigenvalues are treated as
///   one repeated eigenvalue when computing eigenvectors.
/// - `symmetry_tol`: relative asymmetry under which the symmetric
///   eigensolver is used.
///
/// Invariants
/// ----------
/// - Every field is finite and strictly positive.
/// - `stable_residual <= max_residual`, `stable_condition <= max_condition`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityTolerances {
    pub stable_residual: f64,
    pub max_residual: f64,
    pub min_eigen_gap: f64,
    pub stable_condition: f64,
    pub max_condition: f64,
    pub cluster_tol: f64,
    pub symmetry_tol: f64,
}

impl StabilityTolerances {
    /// Construct validated stability tolerances.
    ///
    /// # Errors
    /// - [`ExpmError::InvalidTolerance`] if any value is non-finite or ≤ 0, or
    ///   if a stable threshold exceeds its hard limit.
    pub fn new(
        stable_residual: f64, max_residual: f64, min_eigen_gap: f64, stable_condition: f64,
        max_condition: f64, cluster_tol: f64, symmetry_tol: f64,
    ) -> ExpmResult<Self> {
        verify_tolerance("stable_residual", stable_residual)?;
        verify_tolerance("max_residual", max_residual)?;
        verify_tolerance("min_eigen_gap", min_eigen_gap)?;
        verify_tolerance("stable_condition", stable_condition)?;
        verify_tolerance("max_condition", max_condition)?;
        verify_tolerance("cluster_tol", cluster_tol)?;
        verify_tolerance("symmetry_tol", symmetry_tol)?;
        if stable_residual > max_residual {
            return Err(ExpmError::InvalidTolerance {
                name: "stable_residual",
                value: stable_residual,
                reason: "Stable residual must not exceed max_residual.",
            });
        }
        if stable_condition > max_condition {
            return Err(ExpmError::InvalidTolerance {
                name: "stable_condition",
                value: stable_condition,
                reason: "Stable condition number must not exceed max_condition.",
            });
        }
        Ok(Self {
            stable_residual,
            max_residual,
            min_eigen_gap,
            stable_condition,
            max_condition,
            cluster_tol,
            symmetry_tol,
        })
    }
}

impl Default for StabilityTolerances {
    fn default() -> Self {
        Self {
            stable_residual: 1e-9,
            max_residual: 1e-6,
            min_eigen_gap: 1e-6,
            stable_condition: 1e8,
            max_condition: 1e12,
            cluster_tol: 1e-6,
            symmetry_tol: 1e-12,
        }
    }
}

/// ExpmOptions — controls for the exponential solvers.
///
/// - `row_sum_tol`: tolerance for the independent row-sum check applied to
///   results from Degenerate decompositions and to Pade output for generator
///   inputs.
/// - `max_refinements`: extra scaling-and-squaring attempts (each with one
///   more squaring) before [`ExpmError::ExponentiationError`] is raised.
/// - `max_squarings`: hard cap on the number of squarings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpmOptions {
    pub row_sum_tol: f64,
    pub max_refinements: usize,
    pub max_squarings: u32,
}

impl ExpmOptions {
    /// Construct validated exponential options.
    ///
    /// # Errors
    /// - [`ExpmError::InvalidTolerance`] for a non-finite or non-positive
    ///   `row_sum_tol`, or a zero `max_squarings`.
    pub fn new(row_sum_tol: f64, max_refinements: usize, max_squarings: u32) -> ExpmResult<Self> {
        verify_tolerance("row_sum_tol", row_sum_tol)?;
        if max_squarings == 0 {
            return Err(ExpmError::InvalidTolerance {
                name: "max_squarings",
                value: 0.0,
                reason: "At least one squaring must be allowed.",
            });
        }
        Ok(Self { row_sum_tol, max_refinements, max_squarings })
    }
}

impl Default for ExpmOptions {
    fn default() -> Self {
        Self { row_sum_tol: 1e-8, max_refinements: 3, max_squarings: 1100 }
    }
}

/// LogarithmOptions — controls for the matrix logarithm.
///
/// - `domain_tol`: eigenvalues with modulus at or below this value are
///   treated as zero; eigenvalues whose imaginary part is at or below
///   `domain_tol · |λ|` are treated as real.
/// - `accuracy_tol`: relative residual of `exp(log P)` against `P` above which
///   a [`LogarithmAccuracyWarning`](crate::errors::LogarithmAccuracyWarning)
///   is attached.
/// - `max_residual`: hard limit on the same residual. Above it, or when the
///   residual is not finite, the logarithm fails with
///   [`ExpmError::LogarithmAccuracyError`] instead of warning.
/// - `series_terms`: maximum number of terms in the series fallback.
///
/// Invariants
/// ----------
/// - `accuracy_tol <= max_residual`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogarithmOptions {
    pub domain_tol: f64,
    pub accuracy_tol: f64,
    pub max_residual: f64,
    pub series_terms: usize,
}

impl LogarithmOptions {
    /// Construct validated logarithm options.
    ///
    /// # Errors
    /// - [`ExpmError::InvalidTolerance`] for invalid tolerances, for
    ///   `accuracy_tol > max_residual`, or for zero `series_terms`.
    pub fn new(
        domain_tol: f64, accuracy_tol: f64, max_residual: f64, series_terms: usize,
    ) -> ExpmResult<Self> {
        verify_tolerance("domain_tol", domain_tol)?;
        verify_tolerance("accuracy_tol", accuracy_tol)?;
        verify_tolerance("max_residual", max_residual)?;
        if accuracy_tol > max_residual {
            return Err(ExpmError::InvalidTolerance {
                name: "accuracy_tol",
                value: accuracy_tol,
                reason: "Accuracy tolerance must not exceed max_residual.",
            });
        }
        if series_terms == 0 {
            return Err(ExpmError::InvalidTolerance {
                name: "series_terms",
                value: 0.0,
                reason: "Series fallback needs at least one term.",
            });
        }
        Ok(Self { domain_tol, accuracy_tol, max_residual, series_terms })
    }
}

impl Default for LogarithmOptions {
    fn default() -> Self {
        Self { domain_tol: 1e-12, accuracy_tol: 1e-6, max_residual: 1e-2, series_terms: 200 }
    }
}

/// CacheOptions — bound on the number of cached eigendecompositions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    pub max_entries: usize,
}

impl CacheOptions {
    /// # Errors
    /// Returns [`ExpmError::InvalidCacheCapacity`] when `max_entries == 0`.
    pub fn new(max_entries: usize) -> ExpmResult<Self> {
        if max_entries == 0 {
            return Err(ExpmError::InvalidCacheCapacity {
                max_entries,
                reason: "Cache must hold at least one entry.",
            });
        }
        Ok(Self { max_entries })
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { max_entries: DEFAULT_CACHE_ENTRIES }
    }
}

/// EngineOptions — full configuration for a
/// [`MatrixFunctionEngine`](crate::engine::MatrixFunctionEngine).
///
/// Each component is validated by its own constructor; this struct adds no
/// cross-field checks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineOptions {
    pub stability: StabilityTolerances,
    pub expm: ExpmOptions,
    pub logarithm: LogarithmOptions,
    pub cache: CacheOptions,
}

impl EngineOptions {
    pub fn new(
        stability: StabilityTolerances, expm: ExpmOptions, logarithm: LogarithmOptions,
        cache: CacheOptions,
    ) -> EngineOptions {
        EngineOptions { stability, expm, logarithm, cache }
    }
}
