//! Spectral reconstruction `exp(Q·t) = I + V·diag(exp(λ·t) − 1)·V⁻¹` and
//! the checks applied to spectral results before they are returned.
//!
//! Key behaviors
//! -------------
//! - The identity is added exactly and only `e^{λt} − 1` goes through the
//!   eigenvectors, so off-diagonal probabilities of slow generators keep
//!   their relative accuracy instead of drowning in the cancellation of
//!   `e^{λt} ≈ 1` terms.
//! - [`is_finite_and_real`] guards every spectral result: overflow in
//!   `e^{λt}` (negative `t` for a generator, or a positive eigenvalue) must
//!   never reach the caller as NaN.
//! - [`passes_independent_check`] additionally validates results from
//!   Degenerate decompositions against a truncated Taylor expansion of the
//!   matrix function ([`TaylorReference`]) and, for generators, against
//!   row-stochasticity.
use crate::{
    core::generator::{is_stochastic, is_valid_generator},
    solve::{
        dense::{inf_norm, to_array},
        eigen::Eigendecomposition,
    },
};
use nalgebra::DMatrix;
use ndarray::Array2;
use num_complex::Complex64;

/// Round-off allowance, in units of `n · ε · max(1, ‖P‖∞)`, for
/// [`TaylorReference::contains`].
const ROUNDOFF_ULPS: f64 = 64.0;

/// Upper bound on series terms summed by [`exp_tail`] for `y < 1`.
const MAX_TAIL_TERMS: u32 = 60;

/// Spectral exponential at time `t`.
///
/// Returns the real part of the reconstruction and the largest absolute
/// imaginary entry discarded from it.
pub fn spectral_exponential(decomposition: &Eigendecomposition, t: f64) -> (Array2<f64>, f64) {
    let (mut p, imag) = decomposition.reconstruct_real(|lambda| expm1_complex(lambda * t));
    for i in 0..p.nrows() {
        p[[i, i]] += 1.0;
    }
    (p, imag)
}

/// `e^z − 1` without cancellation for small `|z|`.
pub fn expm1_complex(z: Complex64) -> Complex64 {
    let (sin, cos) = z.im.sin_cos();
    let half = (0.5 * z.im).sin();
    Complex64::new(z.re.exp_m1() * cos - 2.0 * half * half, z.re.exp() * sin)
}

/// Every entry is finite and the discarded imaginary part is at most
/// `tol · max(1, max |P|)`.
pub fn is_finite_and_real(result: &Array2<f64>, imag: f64, tol: f64) -> bool {
    if !imag.is_finite() || result.iter().any(|v| !v.is_finite()) {
        return false;
    }
    let scale = result.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    imag <= tol * scale
}

/// TaylorReference — `c₀·I + c₁·A` plus a bound on everything it omits.
///
/// Purpose
/// -------
/// Give a scale-aware consistency test for a matrix function of `A` that
/// does not trust the eigenvectors: for small `‖A‖` the expansion is tight,
/// so a spectral result that lost `A`'s off-diagonal structure is rejected
/// even when its rows still sum to one.
///
/// Fields
/// ------
/// - `identity`: coefficient `c₀` of `I`.
/// - `linear`: coefficient `c₁` of `A`.
/// - `remainder`: upper bound on the ∞-norm of the omitted terms (may be
///   `+∞`, in which case every finite result is accepted).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaylorReference {
    pub identity: f64,
    pub linear: f64,
    pub remainder: f64,
}

impl TaylorReference {
    /// `exp(A·t) = I + t·A + R` with `‖R‖∞ ≤ e^x − 1 − x`, `x = |t|·‖A‖∞`.
    pub fn exponential(a_norm: f64, t: f64) -> Self {
        Self { identity: 1.0, linear: t, remainder: exp_tail(t.abs() * a_norm, 1) }
    }

    /// `∫₀ᵗ exp(A·s) ds = t·I + (t²/2)·A + R` with
    /// `‖R‖∞ ≤ Σ_{k≥2} ‖A‖∞^k |t|^{k+1} / (k+1)!`.
    pub fn interval(a_norm: f64, t: f64) -> Self {
        let remainder =
            if a_norm > 0.0 { exp_tail(t.abs() * a_norm, 2) / a_norm } else { 0.0 };
        Self { identity: t, linear: 0.5 * t * t, remainder }
    }

    /// Whether `‖result − (c₀·I + c₁·A)‖∞` is within the remainder bound,
    /// allowing a few ulps of round-off per entry.
    pub fn contains(&self, a: &DMatrix<f64>, result: &Array2<f64>) -> bool {
        let n = result.nrows();
        let mut deviation = 0.0_f64;
        let mut result_norm = 0.0_f64;
        for i in 0..n {
            let mut row_dev = 0.0;
            let mut row_abs = 0.0;
            for j in 0..n {
                let diag = if i == j { self.identity } else { 0.0 };
                let reference = diag + self.linear * a[(i, j)];
                row_dev += (result[[i, j]] - reference).abs();
                row_abs += result[[i, j]].abs();
            }
            deviation = deviation.max(row_dev);
            result_norm = result_norm.max(row_abs);
        }
        let slack = ROUNDOFF_ULPS * n as f64 * f64::EPSILON * result_norm.max(1.0);
        deviation <= self.remainder + slack
    }
}

/// Independent validation of a spectral result that does not reuse the
/// eigenvectors' accuracy claims.
///
/// - [`is_finite_and_real`] must hold.
/// - `result` must lie within `reference` around the decomposed matrix.
/// - When the decomposed matrix is a generator, `result` must be
///   row-stochastic within `tol`.
pub fn passes_independent_check(
    decomposition: &Eigendecomposition, result: &Array2<f64>, imag: f64,
    reference: &TaylorReference, tol: f64,
) -> bool {
    if !is_finite_and_real(result, imag, tol) {
        return false;
    }
    let q = decomposition.original();
    if !reference.contains(q, result) {
        return false;
    }
    let q = to_array(q);
    if is_valid_generator(q.view(), tol) {
        return is_stochastic(result.view(), tol);
    }
    true
}

/// [`TaylorReference::exponential`] for the decomposed matrix.
pub fn exponential_reference(decomposition: &Eigendecomposition, t: f64) -> TaylorReference {
    TaylorReference::exponential(inf_norm(decomposition.original()), t)
}

/// `Σ_{k > order} y^k / k!` for `y ≥ 0`.
fn exp_tail(y: f64, order: u32) -> f64 {
    let mut term = 1.0_f64;
    let mut head = 1.0_f64;
    for k in 1..=order {
        term *= y / f64::from(k);
        head += term;
    }
    if y >= 1.0 {
        return y.exp() - head;
    }
    let mut tail = 0.0_f64;
    for k in (order + 1)..=(order + MAX_TAIL_TERMS) {
        term *= y / f64::from(k);
        tail += term;
        if term <= f64::EPSILON * tail {
            break;
        }
    }
    tail
}
