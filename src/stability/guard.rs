//! StabilityGuard — decide whether a decomposition can be trusted.
//!
//! Purpose
//! -------
//! Turn an [`Eigendecomposition`] into a tagged [`StabilityVerdict`] that the
//! solvers match on to pick a strategy. The guard is a pure function of the
//! decomposition and the tolerances; it is evaluated once per decomposition
//! and cached alongside it.
//!
//! Key behaviors
//! -------------
//! - Residual: `‖Re(V·Λ·V⁻¹) − A‖_F / ‖A‖_F`, plus the largest imaginary
//!   entry of the reconstruction relative to the same scale. Both are
//!   absolute for the zero matrix.
//! - Eigen-gap: smallest pairwise `|λ_i − λ_j|` divided by `max |λ|`.
//!   Clustered (repeated) eigenvalues give a gap of zero. Neither metric is
//!   floored at 1, so generators with rates far below 1 are judged on their
//!   own scale.
//! - Condition: 2-norm condition number of `V` (1 on the symmetric path).
//!
//! Classification
//! --------------
//! - **Defective**: any metric is non-finite, the residual or imaginary
//!   residual exceeds `max_residual`, or the condition number exceeds
//!   `max_condition`.
//! - **Stable**: residual and imaginary residual ≤ `stable_residual`,
//!   condition ≤ `stable_condition`, and eigen-gap ≥ `min_eigen_gap`.
//! - **Degenerate**: everything in between. Usable, but results must pass
//!   an independent check.
use crate::{core::options::StabilityTolerances, solve::eigen::Eigendecomposition};

/// Strategy-selecting classification of an eigendecomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StabilityVerdict {
    /// Spectral reconstruction can be used directly.
    Stable,
    /// Spectral reconstruction is usable but each result must be validated.
    Degenerate,
    /// Eigenvectors are unreliable; use scaling-and-squaring.
    Defective,
}

/// Metrics behind a [`StabilityVerdict`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityReport {
    pub verdict: StabilityVerdict,
    pub residual: f64,
    pub imag_residual: f64,
    pub min_eigen_gap: f64,
    pub condition: f64,
}

/// Compute the stability metrics and verdict of `decomposition`.
pub fn assess(decomposition: &Eigendecomposition, tol: &StabilityTolerances) -> StabilityReport {
    let original = decomposition.original();
    let norm = original.norm();
    let scale = if norm > 0.0 { norm } else { 1.0 };

    let recon = decomposition.reconstruct_with(|z| z);
    let mut diff_sq = 0.0_f64;
    let mut imag = 0.0_f64;
    for (z, &a) in recon.iter().zip(original.iter()) {
        diff_sq += (z.re - a).powi(2);
        imag = imag.max(z.im.abs());
    }
    let residual = diff_sq.sqrt() / scale;
    let imag_residual = imag / scale;
    let min_eigen_gap = relative_eigen_gap(decomposition);
    let condition = decomposition.condition_number();

    let verdict = verdict_from(residual, imag_residual, min_eigen_gap, condition, tol);
    StabilityReport { verdict, residual, imag_residual, min_eigen_gap, condition }
}

/// Verdict-only form of [`assess`].
pub fn classify(decomposition: &Eigendecomposition, tol: &StabilityTolerances) -> StabilityVerdict {
    assess(decomposition, tol).verdict
}

fn verdict_from(
    residual: f64, imag_residual: f64, min_eigen_gap: f64, condition: f64,
    tol: &StabilityTolerances,
) -> StabilityVerdict {
    let finite = residual.is_finite()
        && imag_residual.is_finite()
        && condition.is_finite()
        && !min_eigen_gap.is_nan();
    if !finite
        || residual > tol.max_residual
        || imag_residual > tol.max_residual
        || condition > tol.max_condition
    {
        return StabilityVerdict::Defective;
    }
    if residual <= tol.stable_residual
        && imag_residual <= tol.stable_residual
        && condition <= tol.stable_condition
        && min_eigen_gap >= tol.min_eigen_gap
    {
        return StabilityVerdict::Stable;
    }
    StabilityVerdict::Degenerate
}

/// Smallest pairwise eigenvalue distance relative to the spectral radius.
///
/// A 1×1 matrix has no pairs and reports `+∞`. With `ρ = 0` every
/// eigenvalue is zero and the absolute gap is returned.
fn relative_eigen_gap(decomposition: &Eigendecomposition) -> f64 {
    let values = decomposition.values();
    let radius = values.iter().fold(0.0_f64, |acc, z| acc.max(z.norm()));
    let mut gap = f64::INFINITY;
    for (i, a) in values.iter().enumerate() {
        for b in &values[i + 1..] {
            gap = gap.min((a - b).norm());
        }
    }
    if radius == 0.0 {
        return gap;
    }
    gap / radius
}
