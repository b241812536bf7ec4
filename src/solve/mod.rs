//! solve — dense linear algebra and eigendecomposition.
//!
//! Purpose
//! -------
//! Bridge the crate's `ndarray` surface to `nalgebra` factorizations and
//! provide the general (complex) eigendecomposition consumed by the cache and
//! the solvers.
//!
//! Key behaviors
//! -------------
//! - [`dense`]: conversions, LU solves and inverses, norms, condition numbers.
//! - [`eigen`]: [`Eigendecomposition`] and [`decompose`], with a symmetric
//!   fast path and eigenvalue clustering for repeated eigenvalues.
//!
//! Conventions
//! -----------
//! - All factorizations operate on owned `nalgebra::DMatrix` copies; inputs
//!   are never mutated.

pub mod dense;
pub mod eigen;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::eigen::{Eigendecomposition, decompose};
