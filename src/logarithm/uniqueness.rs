//! Sufficient conditions for a transition matrix to have a unique generator.
//!
//! A stochastic matrix can be embeddable in several continuous-time chains
//! at once (different branches of the logarithm). Two classical sufficient
//! conditions rule that out:
//!
//! - the eigenvalues of `P` are distinct, real and positive;
//! - `det P > 1/2` and `‖P − I‖₁ < 1/2`.
//!
//! Failing both does not prove non-uniqueness; the result is then
//! [`GeneratorUniqueness::Undetermined`].
use crate::{
    core::{options::StabilityTolerances, validation::validate_square},
    errors::ExpmResult,
    solve::dense::{one_norm, to_dmatrix},
};
use nalgebra::DMatrix;
use ndarray::ArrayView2;

/// Outcome of [`generator_uniqueness`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorUniqueness {
    /// Distinct positive real spectrum.
    DistinctPositiveSpectrum,
    /// `det P > 1/2` and `‖P − I‖₁ < 1/2`.
    NearIdentity,
    /// Neither sufficient condition holds.
    Undetermined,
}

impl GeneratorUniqueness {
    pub fn is_unique(self) -> bool {
        !matches!(self, GeneratorUniqueness::Undetermined)
    }
}

/// Check whether `p` has at most one real logarithm that is a generator.
///
/// Parameters
/// ----------
/// - `p`: `ArrayView2<f64>`
///   Finite square matrix, typically stochastic.
/// - `tol`: `&StabilityTolerances`
///   `cluster_tol` decides both "real" (`|Im λ| ≤ cluster_tol·|λ|`) and
///   "distinct" (relative gap above `cluster_tol`).
///
/// Errors
/// ------
/// - Validation errors for the matrix.
pub fn generator_uniqueness(
    p: ArrayView2<'_, f64>, tol: &StabilityTolerances,
) -> ExpmResult<GeneratorUniqueness> {
    let n = validate_square(p)?;
    let m = to_dmatrix(p);

    if has_distinct_positive_spectrum(&m, tol.cluster_tol) {
        return Ok(GeneratorUniqueness::DistinctPositiveSpectrum);
    }
    let offset = one_norm(&(&m - DMatrix::<f64>::identity(n, n)));
    if m.clone().determinant() > 0.5 && offset < 0.5 {
        return Ok(GeneratorUniqueness::NearIdentity);
    }
    Ok(GeneratorUniqueness::Undetermined)
}

fn has_distinct_positive_spectrum(m: &DMatrix<f64>, cluster_tol: f64) -> bool {
    let values = m.complex_eigenvalues();
    let mut reals = Vec::with_capacity(values.len());
    for z in values.iter() {
        if z.im.abs() > cluster_tol * z.norm() || z.re <= 0.0 {
            return false;
        }
        reals.push(z.re);
    }
    reals.sort_by(f64::total_cmp);
    let scale = reals.last().copied().unwrap_or(1.0);
    reals.windows(2).all(|w| (w[1] - w[0]) / scale > cluster_tol)
}
