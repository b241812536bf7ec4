//! Validation helpers for matrix inputs and numeric configuration.
//!
//! This module centralizes the consistency checks shared by every solver:
//!
//! - **Matrix shape**: [`validate_square`] rejects empty, non-square, and
//!   non-finite inputs before any numerical work starts.
//! - **Time scalars**: [`validate_time`] enforces finiteness.
//! - **Tolerances**: [`verify_tolerance`] ensures configuration values are
//!   finite and strictly positive.
//!
//! All helpers return domain-specific [`ExpmError`] variants so higher-level
//! code reports problems uniformly.
use crate::errors::{ExpmError, ExpmResult};
use ndarray::ArrayView2;

/// Validate that `a` is a non-empty, square matrix of finite entries.
///
/// # Returns
/// The dimension `n` of the `n×n` matrix.
///
/// # Errors
/// - [`ExpmError::EmptyMatrix`] if either dimension is zero.
/// - [`ExpmError::NotSquare`] if `rows != cols`.
/// - [`ExpmError::NonFiniteEntry`] with the first offending position.
pub fn validate_square(a: ArrayView2<'_, f64>) -> ExpmResult<usize> {
    let (rows, cols) = a.dim();
    if rows == 0 || cols == 0 {
        return Err(ExpmError::EmptyMatrix);
    }
    if rows != cols {
        return Err(ExpmError::NotSquare { rows, cols });
    }
    for ((row, col), &value) in a.indexed_iter() {
        if !value.is_finite() {
            return Err(ExpmError::NonFiniteEntry { row, col, value });
        }
    }
    Ok(rows)
}

/// Validate that a time (branch-length) scalar is finite.
///
/// Negative values are accepted; the solvers only require finiteness.
///
/// # Errors
/// Returns [`ExpmError::NonFiniteTime`] for `NaN` or `±∞`.
pub fn validate_time(t: f64) -> ExpmResult<()> {
    if !t.is_finite() {
        return Err(ExpmError::NonFiniteTime { t });
    }
    Ok(())
}

/// Validate a named tolerance: it must be **finite** and **strictly positive**.
///
/// # Errors
/// Returns [`ExpmError::InvalidTolerance`] if the value is non-finite or ≤ 0.0.
pub fn verify_tolerance(name: &'static str, value: f64) -> ExpmResult<()> {
    if !value.is_finite() {
        return Err(ExpmError::InvalidTolerance {
            name,
            value,
            reason: "Tolerance must be finite.",
        });
    }
    if value <= 0.0 {
        return Err(ExpmError::InvalidTolerance {
            name,
            value,
            reason: "Tolerance must be positive.",
        });
    }
    Ok(())
}
