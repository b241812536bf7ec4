//! integration — rate-heterogeneity integrals of the matrix exponential.
//!
//! Purpose
//! -------
//! Compute `E[exp(Q·T)]` for a random rate `T` and the interval integral
//! `∫₀ᵗ exp(Q·s) ds`, sharing decompositions with the exponential solver.
//!
//! Key behaviors
//! -------------
//! - [`distributions`]: the [`RateDistribution`] trait and the exponential,
//!   gamma, uniform, discrete and discrete-gamma families.
//! - [`quadrature`]: Golub–Welsch Gauss–Laguerre and Gauss–Legendre rules.
//! - [`solver`]: [`IntegrationSolver`] and [`QuadratureSpec`].
//!
//! Conventions
//! -----------
//! - The node scheme is part of each distribution: Gauss–Laguerre for the
//!   exponential and gamma families, Gauss–Legendre for uniform, the atoms
//!   themselves for discrete families. An `n`-node Gaussian rule is exact for
//!   polynomial integrands up to degree `2n − 1`; the node count in
//!   [`QuadratureSpec`] trades accuracy against `n` exponentials per call.

pub mod distributions;
pub mod quadrature;
pub mod solver;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::distributions::{
    DiscreteGammaRates, DiscreteRates, ExponentialRates, GammaRates, RateDistribution,
    UniformRates,
};
pub use self::quadrature::{MAX_QUADRATURE_NODES, QuadratureRule, gauss_laguerre, gauss_legendre};
pub use self::solver::{IntegrationSolver, IntegrationStrategy, QuadratureSpec};
