//! errors — crate-wide error surface for matrix exponentials and logarithms.
//!
//! Purpose
//! -------
//! Define [`ExpmError`], the single error type returned by every fallible
//! operation in this crate, together with the [`ExpmResult`] alias and the
//! non-fatal [`LogarithmAccuracyWarning`]. Keeping one enum lets the cache
//! memoise failures and hand the same value to every waiting thread.
//!
//! Key behaviors
//! -------------
//! - Group failures into input validation, configuration, and numerical
//!   failures (decomposition, exponentiation, logarithm domain).
//! - Provide readable diagnostics through `Display`.
//! - Convert into a Python `ValueError` when the `python-bindings` feature is
//!   enabled.
//!
//! Conventions
//! -----------
//! - Indices are 0-based (row, column).
//! - Numerical near-misses are never reported here; they are absorbed by
//!   strategy fallback inside the solvers. Only failures with no viable
//!   strategy left reach the caller.

/// Crate-wide result alias for operations that may produce [`ExpmError`].
pub type ExpmResult<T> = Result<T, ExpmError>;

/// Unified error type for matrix-function evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpmError {
    // ---- Input validation ----
    /// Matrix has no rows or no columns.
    EmptyMatrix,

    /// Matrix must be square.
    NotSquare { rows: usize, cols: usize },

    /// An entry is NaN or ±inf.
    NonFiniteEntry { row: usize, col: usize, value: f64 },

    /// The time scalar must be finite.
    NonFiniteTime { t: f64 },

    /// Matrix violates the generator-matrix invariants.
    InvalidGenerator { row: usize, value: f64, reason: &'static str },

    /// Two inputs that must agree in size do not.
    DimensionMismatch { expected: usize, found: usize },

    // ---- Configuration ----
    /// Tolerance must be finite and strictly positive (and ordered where required).
    InvalidTolerance { name: &'static str, value: f64, reason: &'static str },

    /// Cache bound must be at least one entry.
    InvalidCacheCapacity { max_entries: usize, reason: &'static str },

    /// Quadrature node count outside the supported range.
    InvalidNodeCount { nodes: usize, reason: &'static str },

    /// Rate-distribution parameter is invalid.
    InvalidDistributionParam { name: &'static str, value: f64, reason: &'static str },

    /// Closed-form integration was requested but is not available.
    ClosedFormUnavailable { distribution: &'static str, reason: &'static str },

    // ---- Numerical failures ----
    /// Eigenvectors are singular to working precision or non-finite.
    DecompositionError { reason: &'static str, rcond: f64 },

    /// No exponentiation strategy converged within tolerance.
    ExponentiationError { attempts: usize, reason: &'static str },

    /// The matrix has no real principal logarithm.
    LogarithmDomainError { re: f64, im: f64, reason: &'static str },

    /// A logarithm was computed but `exp(L)` misses `P` by more than the
    /// hard residual limit (or could not be re-exponentiated at all).
    LogarithmAccuracyError { residual: f64, max_residual: f64 },
}

impl std::error::Error for ExpmError {}

impl std::fmt::Display for ExpmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Input validation ----
            ExpmError::EmptyMatrix => write!(f, "Matrix is empty."),
            ExpmError::NotSquare { rows, cols } => {
                write!(f, "Matrix must be square; got {rows}x{cols}.")
            }
            ExpmError::NonFiniteEntry { row, col, value } => {
                write!(f, "Matrix entry ({row}, {col}) is non-finite: {value}")
            }
            ExpmError::NonFiniteTime { t } => write!(f, "Time scalar must be finite; got {t}"),
            ExpmError::InvalidGenerator { row, value, reason } => {
                write!(f, "Row {row} violates the generator invariants ({value}): {reason}")
            }
            ExpmError::DimensionMismatch { expected, found } => {
                write!(f, "Dimension mismatch: expected {expected}, found {found}")
            }

            // ---- Configuration ----
            ExpmError::InvalidTolerance { name, value, reason } => {
                write!(f, "Invalid tolerance {name} = {value}: {reason}")
            }
            ExpmError::InvalidCacheCapacity { max_entries, reason } => {
                write!(f, "Invalid cache capacity {max_entries}: {reason}")
            }
            ExpmError::InvalidNodeCount { nodes, reason } => {
                write!(f, "Invalid quadrature node count {nodes}: {reason}")
            }
            ExpmError::InvalidDistributionParam { name, value, reason } => {
                write!(f, "Invalid rate-distribution parameter {name} = {value}: {reason}")
            }
            ExpmError::ClosedFormUnavailable { distribution, reason } => {
                write!(f, "Closed-form integral unavailable for {distribution}: {reason}")
            }

            // ---- Numerical failures ----
            ExpmError::DecompositionError { reason, rcond } => {
                write!(f, "Eigendecomposition failed (rcond = {rcond:e}): {reason}")
            }
            ExpmError::ExponentiationError { attempts, reason } => {
                write!(f, "Matrix exponential did not converge after {attempts} attempts: {reason}")
            }
            ExpmError::LogarithmDomainError { re, im, reason } => {
                write!(f, "No real principal logarithm (eigenvalue {re} + {im}i): {reason}")
            }
            ExpmError::LogarithmAccuracyError { residual, max_residual } => {
                write!(
                    f,
                    "Logarithm re-exponentiation residual {residual:e} exceeds the hard limit \
                     {max_residual:e}"
                )
            }
        }
    }
}

/// LogarithmAccuracyWarning — re-exponentiation residual above tolerance.
///
/// Returned alongside a logarithm whose residual lies between
/// `accuracy_tol` and `max_residual`, so batch pipelines can decide whether
/// to keep the result. Residuals above `max_residual` are
/// [`ExpmError::LogarithmAccuracyError`] instead.
///
/// Fields
/// ------
/// - `residual`: `f64`
///   Relative Frobenius residual `‖exp(L) − P‖ / max(1, ‖P‖)`.
/// - `tolerance`: `f64`
///   The configured accuracy tolerance that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogarithmAccuracyWarning {
    pub residual: f64,
    pub tolerance: f64,
}

impl std::fmt::Display for LogarithmAccuracyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Logarithm re-exponentiation residual {:e} exceeds tolerance {:e}",
            self.residual, self.tolerance
        )
    }
}

/// Convert an [`ExpmError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl std::convert::From<ExpmError> for pyo3::PyErr {
    fn from(err: ExpmError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
