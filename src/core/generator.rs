//! Generator and stochastic matrix checks.
//!
//! Purpose
//! -------
//! Provide the invariant checks for continuous-time Markov generator
//! matrices (rows sum to zero, non-negative off-diagonal rates) and for the
//! stochastic matrices they exponentiate to (rows sum to one, non-negative
//! entries). The solvers use the cheap row-sum tests to pick the independent
//! check applied to Degenerate spectral results.
//!
//! Key behaviors
//! -------------
//! - [`validate_generator`] reports the first violated invariant as a typed
//!   error; [`is_valid_generator`] is its boolean form.
//! - [`is_stochastic`] checks the approximate invariant of `exp(Q·t)`.
//! - [`rows_sum_to`] is the shared cheap test used inside the solvers.
//! - [`GeneratorMatrix`] is an owned, validated wrapper for callers that want
//!   the invariant carried in the type.
//!
//! Conventions
//! -----------
//! - Tolerances are absolute but scaled by `max(1, max |row entry|)` for row
//!   sums so that large rates do not trip the check through rounding alone.
use crate::{
    core::validation::validate_square,
    errors::{ExpmError, ExpmResult},
};
use ndarray::{Array2, ArrayView2};

/// Validate the generator-matrix invariants of `q` within `tol`.
///
/// Checks, in order, per row:
/// 1. off-diagonal entries are ≥ `-tol`,
/// 2. the diagonal entry is ≤ `tol`,
/// 3. the row sums to zero within `tol · max(1, max |q_ij|)`.
///
/// # Errors
/// - Any error from [`validate_square`].
/// - [`ExpmError::InvalidGenerator`] naming the first offending row.
pub fn validate_generator(q: ArrayView2<'_, f64>, tol: f64) -> ExpmResult<()> {
    let n = validate_square(q)?;
    for i in 0..n {
        let row = q.row(i);
        for (j, &v) in row.iter().enumerate() {
            if i != j && v < -tol {
                return Err(ExpmError::InvalidGenerator {
                    row: i,
                    value: v,
                    reason: "Off-diagonal rates must be non-negative.",
                });
            }
        }
        if row[i] > tol {
            return Err(ExpmError::InvalidGenerator {
                row: i,
                value: row[i],
                reason: "Diagonal entries must be non-positive.",
            });
        }
        let sum: f64 = row.sum();
        let scale = row.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
        if sum.abs() > tol * scale {
            return Err(ExpmError::InvalidGenerator {
                row: i,
                value: sum,
                reason: "Rows must sum to zero.",
            });
        }
    }
    Ok(())
}

/// Boolean form of [`validate_generator`].
pub fn is_valid_generator(q: ArrayView2<'_, f64>, tol: f64) -> bool {
    validate_generator(q, tol).is_ok()
}

/// Whether `p` is (approximately) row-stochastic: entries ≥ `-tol` and every
/// row sums to one within `tol`.
pub fn is_stochastic(p: ArrayView2<'_, f64>, tol: f64) -> bool {
    if p.iter().any(|v| !v.is_finite() || *v < -tol) {
        return false;
    }
    rows_sum_to(p, 1.0, tol)
}

/// Whether every row of `a` sums to `target` within `tol · max(1, max |a_ij|)`.
pub fn rows_sum_to(a: ArrayView2<'_, f64>, target: f64, tol: f64) -> bool {
    a.rows().into_iter().all(|row| {
        let scale = row.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
        (row.sum() - target).abs() <= tol * scale
    })
}

/// GeneratorMatrix — owned rate matrix with validated generator invariants.
///
/// Purpose
/// -------
/// Carry the generator invariant in the type for callers that build rate
/// matrices once and evaluate them many times. The solvers themselves accept
/// plain [`ArrayView2`] inputs; use [`GeneratorMatrix::view`] to pass one in.
///
/// Invariants
/// ----------
/// - Square, finite, rows sum to zero and off-diagonals are non-negative
///   within the tolerance given at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorMatrix {
    inner: Array2<f64>,
}

impl GeneratorMatrix {
    /// Validate and wrap `q`.
    ///
    /// # Errors
    /// Any error from [`validate_generator`].
    pub fn new(q: Array2<f64>, tol: f64) -> ExpmResult<Self> {
        validate_generator(q.view(), tol)?;
        Ok(Self { inner: q })
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.inner.view()
    }

    /// Number of states.
    pub fn dim(&self) -> usize {
        self.inner.nrows()
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.inner
    }
}
