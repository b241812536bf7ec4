//! logarithm — recover rate matrices from transition matrices.
//!
//! Purpose
//! -------
//! Invert the matrix exponential for a unit time step: given an estimated
//! transition matrix `P`, find `L` with `exp(L) = P`.
//!
//! Key behaviors
//! -------------
//! - [`LogarithmSolver`]: principal real logarithm through the shared
//!   eigendecomposition cache, with a Mercator-series fallback near the
//!   identity and re-exponentiation validation.
//! - [`generator_uniqueness`]: sufficient conditions for `P` to have a
//!   single generator.
//!
//! Conventions
//! -----------
//! - Domain failures are errors; accuracy shortfalls are warnings carried in
//!   [`LogarithmOutcome`].

pub mod solver;
pub mod uniqueness;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::solver::{LogarithmMethod, LogarithmOutcome, LogarithmSolver};
pub use self::uniqueness::{GeneratorUniqueness, generator_uniqueness};
