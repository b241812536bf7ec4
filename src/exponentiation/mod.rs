//! exponentiation — matrix exponential of generator matrices.
//!
//! Purpose
//! -------
//! Compute `exp(Q·t)` for generator matrices across many time scalars,
//! reusing cached eigendecompositions where they can be trusted and falling
//! back to scaling-and-squaring where they cannot.
//!
//! Key behaviors
//! -------------
//! - [`ExponentialSolver`] dispatches on the cached stability verdict.
//! - [`pade`] implements the Higham (2005) scaling-and-squaring algorithm
//!   with bounded refinement.
//! - [`spectral`] holds the eigen-reconstruction and the independent check
//!   used for Degenerate decompositions.
//!
//! Downstream usage
//! ----------------
//! - Construct one `Arc<EigenCache>` per model (or per thread pool) and share
//!   it between an [`ExponentialSolver`] and the other solvers, or use
//!   [`MatrixFunctionEngine`](crate::engine::MatrixFunctionEngine), which
//!   does exactly that.

pub mod pade;
pub mod solver;
pub mod spectral;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::pade::{PadeOutcome, pade_exponential};
pub use self::solver::{ExponentialResult, ExponentialSolver, SolveMethod};
