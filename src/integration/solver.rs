//! IntegrationSolver — rate-integrated exponentials `E[exp(Q·T)]` and
//! interval integrals `∫₀ᵗ exp(Q·s) ds`.
//!
//! Purpose
//! -------
//! Evaluate the exponential of a generator averaged over a rate-heterogeneity
//! distribution, reusing the cached decomposition where possible.
//!
//! Key behaviors
//! -------------
//! - Closed form: when the cached decomposition is not Defective and the
//!   distribution's moment generating function is available at every
//!   eigenvalue, `E[exp(Q·T)] = V·diag(M(λ))·V⁻¹`. Every closed-form result
//!   must be finite and real; Degenerate ones must also pass the independent
//!   check of the exponential solver, with the Taylor reference
//!   `I + E[T]·Q` and a remainder bound from `M(‖Q‖∞)`.
//! - Quadrature: `Σ w_i · exp(Q·t_i)` over the distribution's rule, each
//!   term from [`ExponentialSolver`] (in parallel with `rayon`). This is the
//!   universal fallback.
//! - Interval integral: per-eigenvalue `(e^{λt} − 1) / λ` (Taylor series for
//!   small `|λt|`), or the Van Loan block exponential
//!   `exp([[Q, I], [0, 0]]·t)` whose upper-right block is the integral. The
//!   spectral form is subject to the same finiteness and Degenerate checks,
//!   against `t·I + (t²/2)·Q`.
//!
//! Invariants & assumptions
//! ------------------------
//! - For generator inputs the integrated exponential is a mixture of
//!   stochastic matrices and is itself (approximately) stochastic; rows of
//!   the interval integral sum to `t`.
//! - [`IntegrationStrategy::ClosedForm`] never silently degrades: if the
//!   closed form is unavailable the caller gets
//!   [`ExpmError::ClosedFormUnavailable`].
use crate::{
    cache::eigen_cache::{CachedDecomposition, EigenCache},
    core::{
        generator::{is_valid_generator, rows_sum_to},
        options::ExpmOptions,
        validation::{validate_square, validate_time},
    },
    errors::{ExpmError, ExpmResult},
    exponentiation::{
        pade::pade_exponential,
        solver::{ExponentialResult, ExponentialSolver, SolveMethod},
        spectral::{
            TaylorReference, expm1_complex, is_finite_and_real, passes_independent_check,
        },
    },
    integration::{
        distributions::RateDistribution,
        quadrature::{MAX_QUADRATURE_NODES, validate_node_count},
    },
    solve::dense::{inf_norm, to_dmatrix},
    stability::guard::StabilityVerdict,
};
use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2, s};
use num_complex::Complex64;
use rayon::prelude::*;
use std::sync::Arc;

/// Below this `|λt|` the interval integrand uses its Taylor series.
const INTERVAL_SERIES_THRESHOLD: f64 = 1e-5;

/// Which strategy [`IntegrationSolver::integrate`] may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationStrategy {
    /// Closed form when available, quadrature otherwise.
    #[default]
    Auto,
    /// Closed form only; fail if unavailable.
    ClosedForm,
    /// Quadrature only.
    Quadrature,
}

/// QuadratureSpec — rate distribution plus integration configuration.
///
/// Fields
/// ------
/// - `distribution`: shared [`RateDistribution`].
/// - `nodes`: quadrature node count, `1..=MAX_QUADRATURE_NODES`.
/// - `strategy`: see [`IntegrationStrategy`].
#[derive(Debug, Clone)]
pub struct QuadratureSpec {
    distribution: Arc<dyn RateDistribution>,
    nodes: usize,
    strategy: IntegrationStrategy,
}

impl QuadratureSpec {
    /// # Errors
    /// [`ExpmError::InvalidNodeCount`] for `nodes` outside
    /// `1..=MAX_QUADRATURE_NODES`.
    pub fn new(
        distribution: Arc<dyn RateDistribution>, nodes: usize, strategy: IntegrationStrategy,
    ) -> ExpmResult<Self> {
        validate_node_count(nodes)?;
        Ok(Self { distribution, nodes, strategy })
    }

    /// Auto strategy with `nodes` quadrature nodes.
    pub fn auto(distribution: Arc<dyn RateDistribution>, nodes: usize) -> ExpmResult<Self> {
        Self::new(distribution, nodes, IntegrationStrategy::Auto)
    }

    pub fn distribution(&self) -> &dyn RateDistribution {
        self.distribution.as_ref()
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    pub fn strategy(&self) -> IntegrationStrategy {
        self.strategy
    }

    pub const fn max_nodes() -> usize {
        MAX_QUADRATURE_NODES
    }
}

/// Integration solver sharing an [`EigenCache`] with its inner
/// [`ExponentialSolver`].
#[derive(Debug, Clone)]
pub struct IntegrationSolver {
    exponential: ExponentialSolver,
}

impl IntegrationSolver {
    pub fn new(cache: Arc<EigenCache>, options: ExpmOptions) -> Self {
        Self { exponential: ExponentialSolver::new(cache, options) }
    }

    pub fn exponential_solver(&self) -> &ExponentialSolver {
        &self.exponential
    }

    /// Approximate `E[exp(matrix · T)]` for `T` drawn from `spec.distribution()`.
    ///
    /// Parameters
    /// ----------
    /// - `matrix`: `ArrayView2<f64>`
    ///   Finite square matrix, typically a generator.
    /// - `spec`: `&QuadratureSpec`
    ///   Distribution, node count and strategy.
    ///
    /// Returns
    /// -------
    /// `ExpmResult<ExponentialResult>` with method
    /// [`SolveMethod::ClosedForm`] or [`SolveMethod::Quadrature`].
    ///
    /// Errors
    /// ------
    /// - Validation errors for the matrix.
    /// - [`ExpmError::ClosedFormUnavailable`] under
    ///   [`IntegrationStrategy::ClosedForm`] when no closed form applies.
    /// - [`ExpmError::ExponentiationError`] from a quadrature node.
    pub fn integrate(
        &self, matrix: ArrayView2<'_, f64>, spec: &QuadratureSpec,
    ) -> ExpmResult<ExponentialResult> {
        validate_square(matrix)?;
        let cached = self.exponential.lookup(matrix)?;

        if spec.strategy != IntegrationStrategy::Quadrature {
            match self.closed_form(cached.as_deref(), spec.distribution()) {
                Ok(matrix) => {
                    return Ok(ExponentialResult { matrix, method: SolveMethod::ClosedForm });
                }
                Err(reason) if spec.strategy == IntegrationStrategy::ClosedForm => {
                    return Err(ExpmError::ClosedFormUnavailable {
                        distribution: spec.distribution.name(),
                        reason,
                    });
                }
                Err(reason) => {
                    log::debug!(
                        "integrate: closed form unavailable for {} ({reason}); using quadrature",
                        spec.distribution.name()
                    );
                }
            }
        }
        self.quadrature(matrix, cached.as_deref(), spec)
    }

    /// Closed-form `V·diag(M(λ))·V⁻¹`, or the reason it does not apply.
    fn closed_form(
        &self, cached: Option<&CachedDecomposition>, distribution: &dyn RateDistribution,
    ) -> Result<Array2<f64>, &'static str> {
        let entry = cached.ok_or("Eigendecomposition failed.")?;
        if entry.verdict() == StabilityVerdict::Defective {
            return Err("Eigendecomposition is defective.");
        }
        let diag = entry
            .decomposition
            .values()
            .iter()
            .map(|&lambda| distribution.moment_generating(lambda))
            .collect::<Option<Vec<Complex64>>>()
            .ok_or("Moment generating function is unavailable at an eigenvalue.")?;
        let (p, imag) = entry.decomposition.reconstruct_diag_real(&diag);
        let tol = self.exponential.options().row_sum_tol;
        if !is_finite_and_real(&p, imag, tol) {
            return Err("Closed-form result is not finite and real.");
        }
        if entry.verdict() == StabilityVerdict::Degenerate {
            let reference = mixture_reference(entry.decomposition.original(), distribution);
            if !passes_independent_check(&entry.decomposition, &p, imag, &reference, tol) {
                return Err("Degenerate closed-form result failed validation.");
            }
        }
        Ok(p)
    }

    fn quadrature(
        &self, matrix: ArrayView2<'_, f64>, cached: Option<&CachedDecomposition>,
        spec: &QuadratureSpec,
    ) -> ExpmResult<ExponentialResult> {
        let rule = spec.distribution.quadrature(spec.nodes)?;
        let n = matrix.nrows();
        let terms = rule
            .nodes()
            .par_iter()
            .zip(rule.weights().par_iter())
            .map(|(&t, &w)| -> ExpmResult<Array2<f64>> {
                let p = if t == 0.0 {
                    Array2::eye(n)
                } else {
                    self.exponential.exponential_with(matrix, cached, t)?.matrix
                };
                Ok(p * w)
            })
            .collect::<ExpmResult<Vec<Array2<f64>>>>()?;
        let mut total = Array2::<f64>::zeros((n, n));
        for term in &terms {
            total += term;
        }
        Ok(ExponentialResult {
            matrix: total,
            method: SolveMethod::Quadrature { nodes: rule.len() },
        })
    }

    /// Compute `∫₀ᵗ exp(matrix · s) ds`.
    ///
    /// `t = 0` returns the zero matrix exactly. Negative `t` gives the
    /// signed integral.
    ///
    /// Errors
    /// ------
    /// - Validation errors for the matrix or `t`.
    /// - [`ExpmError::ExponentiationError`] if the Van Loan fallback fails.
    pub fn integrate_interval(
        &self, matrix: ArrayView2<'_, f64>, t: f64,
    ) -> ExpmResult<ExponentialResult> {
        let n = validate_square(matrix)?;
        validate_time(t)?;
        if t == 0.0 {
            return Ok(ExponentialResult {
                matrix: Array2::zeros((n, n)),
                method: SolveMethod::ClosedForm,
            });
        }
        let cached = self.exponential.lookup(matrix)?;
        if let Some(entry) = cached.as_deref() {
            if let Some(p) = self.interval_closed_form(matrix, entry, t) {
                return Ok(ExponentialResult { matrix: p, method: SolveMethod::ClosedForm });
            }
        }
        log::debug!("integrate_interval: using Van Loan block exponential at t = {t}");
        self.van_loan(matrix, t)
    }

    fn interval_closed_form(
        &self, matrix: ArrayView2<'_, f64>, entry: &CachedDecomposition, t: f64,
    ) -> Option<Array2<f64>> {
        let tol = self.exponential.options().row_sum_tol;
        match entry.verdict() {
            StabilityVerdict::Defective => return None,
            StabilityVerdict::Stable | StabilityVerdict::Degenerate => {}
        }
        let diag: Vec<Complex64> =
            entry.decomposition.values().iter().map(|&lambda| interval_factor(lambda, t)).collect();
        let (p, imag) = entry.decomposition.reconstruct_diag_real(&diag);
        if !is_finite_and_real(&p, imag, tol) {
            return None;
        }
        if entry.verdict() == StabilityVerdict::Stable {
            return Some(p);
        }
        let q = entry.decomposition.original();
        if !TaylorReference::interval(inf_norm(q), t).contains(q, &p) {
            return None;
        }
        if is_valid_generator(matrix, tol) && !rows_sum_to(p.view(), t, tol * t.abs().max(1.0)) {
            return None;
        }
        Some(p)
    }

    fn van_loan(&self, matrix: ArrayView2<'_, f64>, t: f64) -> ExpmResult<ExponentialResult> {
        let n = matrix.nrows();
        let q = to_dmatrix(matrix);
        let mut block = DMatrix::<f64>::zeros(2 * n, 2 * n);
        for j in 0..n {
            for i in 0..n {
                block[(i, j)] = q[(i, j)] * t;
            }
            block[(j, n + j)] = t;
        }
        let outcome = pade_exponential(&block, self.exponential.options(), false)?;
        let full = Array2::from_shape_fn((2 * n, 2 * n), |(i, j)| outcome.matrix[(i, j)]);
        Ok(ExponentialResult {
            matrix: full.slice(s![0..n, n..2 * n]).to_owned(),
            method: SolveMethod::VanLoan,
        })
    }
}

/// `(e^{λt} − 1) / λ`, with `t` as the `λ → 0` limit.
fn interval_factor(lambda: Complex64, t: f64) -> Complex64 {
    let z = lambda * t;
    if z.norm() < INTERVAL_SERIES_THRESHOLD {
        return (Complex64::new(1.0, 0.0) + z / 2.0 + z * z / 6.0 + z * z * z / 24.0) * t;
    }
    expm1_complex(z) / lambda
}

/// `E[exp(A·T)] = I + E[T]·A + R` for `T ≥ 0`, with
/// `‖R‖∞ ≤ E[e^{T·x} − 1 − T·x] = M(x) − 1 − E[T]·x` at `x = ‖A‖∞`.
///
/// The bound is infinite when the moment generating function diverges at `x`.
fn mixture_reference(a: &DMatrix<f64>, distribution: &dyn RateDistribution) -> TaylorReference {
    let x = inf_norm(a);
    let mean = distribution.mean();
    let remainder = distribution
        .moment_generating(Complex64::new(x, 0.0))
        .map_or(f64::INFINITY, |m| (m.re - 1.0 - mean * x).max(0.0));
    TaylorReference { identity: 1.0, linear: mean, remainder }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::generator::is_stochastic,
        integration::distributions::{
            DiscreteGammaRates, DiscreteRates, ExponentialRates, GammaRates,
        },
    };
    use crate::core::options::{CacheOptions, StabilityTolerances};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Closed-form vs quadrature agreement.
    // - Strategy forcing and the ClosedFormUnavailable error.
    // - Discrete mixtures against direct sums of exponentials.
    // - Interval integrals: closed form, Van Loan fallback and t = 0.
    // - Overflowing and rejected spectral results falling back instead of
    //   returning non-finite or structurally wrong matrices.
    // -------------------------------------------------------------------------

    fn solver() -> IntegrationSolver {
        IntegrationSolver::new(Arc::new(EigenCache::default()), ExpmOptions::default())
    }

    fn assert_close(a: &Array2<f64>, b: &Array2<f64>, eps: f64) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = eps);
        }
    }

    #[test]
    // Purpose
    // -------
    // The gamma closed form matches the two-state analytic mixture and a
    // forced quadrature evaluation.
    //
    // Given
    // -----
    // - Q = [[-1, 1], [1, -1]] (eigenvalues 0, -2), Gamma(shape 2, mean 0.5).
    //
    // Expect
    // ------
    // - P₀₀ = (1 + M(-2)) / 2 with M(-2) = (1 + 2θ)^(-k).
    // - Quadrature with 64 nodes agrees to 1e-8.
    fn gamma_closed_form_matches_quadrature() {
        // Arrange
        let s = solver();
        let q = array![[-1.0, 1.0], [1.0, -1.0]];
        let gamma = Arc::new(GammaRates::new(2.0, 0.5).unwrap());
        let auto = QuadratureSpec::auto(gamma.clone(), 64).unwrap();
        let forced = QuadratureSpec::new(gamma, 64, IntegrationStrategy::Quadrature).unwrap();

        // Act
        let closed = s.integrate(q.view(), &auto).unwrap();
        let quad = s.integrate(q.view(), &forced).unwrap();

        // Assert
        assert_eq!(closed.method, SolveMethod::ClosedForm);
        assert_eq!(quad.method, SolveMethod::Quadrature { nodes: 64 });
        let m = (1.0_f64 + 2.0 * 0.25).powf(-2.0);
        assert_abs_diff_eq!(closed.matrix[[0, 0]], 0.5 * (1.0 + m), epsilon = 1e-12);
        assert_close(&closed.matrix, &quad.matrix, 1e-8);
        assert!(is_stochastic(closed.matrix.view(), 1e-10));
    }

    #[test]
    // Purpose
    // -------
    // A discrete mixture equals the weighted sum of exponentials, including
    // the zero-rate (invariant) category.
    fn discrete_mixture_matches_direct_sum() {
        let s = solver();
        let q = array![[-0.3, 0.2, 0.1], [0.4, -0.5, 0.1], [0.05, 0.15, -0.2]];
        let dist = Arc::new(DiscreteRates::new(vec![0.0, 0.5, 2.0], vec![0.2, 0.5, 0.3]).unwrap());
        let spec = QuadratureSpec::new(dist, 4, IntegrationStrategy::Quadrature).unwrap();

        let got = s.integrate(q.view(), &spec).unwrap();

        let e = s.exponential_solver();
        let expected = Array2::<f64>::eye(3) * 0.2
            + e.exponential(q.view(), 0.5).unwrap().matrix * 0.5
            + e.exponential(q.view(), 2.0).unwrap().matrix * 0.3;
        assert_close(&got.matrix, &expected, 1e-12);
        assert_eq!(got.method, SolveMethod::Quadrature { nodes: 3 });
    }

    #[test]
    // Purpose
    // -------
    // Closed form and quadrature agree for discrete gamma on a Degenerate
    // (Jukes–Cantor) decomposition.
    fn discrete_gamma_on_jukes_cantor() {
        let s = solver();
        let a = 1.0 / 3.0;
        let q = array![[-1.0, a, a, a], [a, -1.0, a, a], [a, a, -1.0, a], [a, a, a, -1.0]];
        let dist = Arc::new(DiscreteGammaRates::new(0.5, 4).unwrap());

        let auto = QuadratureSpec::auto(dist.clone(), 4).unwrap();
        let forced = QuadratureSpec::new(dist, 4, IntegrationStrategy::Quadrature).unwrap();

        let closed = s.integrate(q.view(), &auto).unwrap();
        let quad = s.integrate(q.view(), &forced).unwrap();

        assert_eq!(closed.method, SolveMethod::ClosedForm);
        assert_close(&closed.matrix, &quad.matrix, 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Forcing the closed form on a defective generator fails with a typed
    // error, while Auto falls back to quadrature.
    fn forced_closed_form_on_defective_matrix_fails() {
        let s = solver();
        let q = array![[-1.0, 1.0, 0.0], [0.0, -1.0, 1.0], [0.0, 0.0, 0.0]];
        let dist = Arc::new(ExponentialRates::new(1.0).unwrap());

        let forced =
            QuadratureSpec::new(dist.clone(), 16, IntegrationStrategy::ClosedForm).unwrap();
        assert!(matches!(
            s.integrate(q.view(), &forced),
            Err(ExpmError::ClosedFormUnavailable { distribution: "exponential", .. })
        ));

        let auto = s.integrate(q.view(), &QuadratureSpec::auto(dist, 16).unwrap()).unwrap();
        assert_eq!(auto.method, SolveMethod::Quadrature { nodes: 16 });
        assert!(is_stochastic(auto.matrix.view(), 1e-8));
    }

    #[test]
    // Purpose
    // -------
    // Interval integral of the two-state chain matches its closed form and
    // the Van Loan block exponential.
    //
    // Given
    // -----
    // - Q = [[-1, 1], [1, -1]], t = 0.8.
    //
    // Expect
    // ------
    // - (∫P)₀₀ = t/2 + (1 − e^{-2t}) / 4; rows sum to t; agreement with
    //   `van_loan` to 1e-12.
    fn interval_integral_matches_closed_form_and_van_loan() {
        let s = solver();
        let q = array![[-1.0, 1.0], [1.0, -1.0]];
        let t = 0.8_f64;

        let closed = s.integrate_interval(q.view(), t).unwrap();
        let block = s.van_loan(q.view(), t).unwrap();

        assert_eq!(closed.method, SolveMethod::ClosedForm);
        assert_eq!(block.method, SolveMethod::VanLoan);
        let expected = t / 2.0 + (1.0 - (-2.0 * t).exp()) / 4.0;
        assert_abs_diff_eq!(closed.matrix[[0, 0]], expected, epsilon = 1e-12);
        assert_abs_diff_eq!(closed.matrix.row(1).sum(), t, epsilon = 1e-12);
        assert_close(&closed.matrix, &block.matrix, 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A defective generator takes the Van Loan path; t = 0 gives exact zeros.
    fn interval_integral_defective_and_zero() {
        let s = solver();
        let q = array![[-1.0, 1.0, 0.0], [0.0, -1.0, 1.0], [0.0, 0.0, 0.0]];
        let t = 2.0_f64;

        let out = s.integrate_interval(q.view(), t).unwrap();
        let zero = s.integrate_interval(q.view(), 0.0).unwrap();

        assert_eq!(out.method, SolveMethod::VanLoan);
        // ∫₀ᵗ e^{-s} ds = 1 − e^{-t}
        assert_abs_diff_eq!(out.matrix[[0, 0]], 1.0 - (-t).exp(), epsilon = 1e-12);
        assert!(rows_sum_to(out.matrix.view(), t, 1e-10));
        assert_eq!(zero.matrix, Array2::<f64>::zeros((3, 3)));
    }

    #[test]
    // Purpose
    // -------
    // A gamma moment generating function that diverges at an eigenvalue
    // blocks the closed form: forced closed form fails, Auto uses quadrature.
    //
    // Given
    // -----
    // - A = [[1, 0.5], [0.2, 2]] with eigenvalues ≈ 0.91 and ≈ 2.09.
    // - Gamma(shape 2, mean 1), whose MGF diverges for Re λ ≥ 2.
    //
    // Expect
    // ------
    // - `ClosedFormUnavailable` for the forced strategy.
    // - Auto returns a finite quadrature result.
    fn divergent_moment_generating_function_blocks_closed_form() {
        // Arrange
        let s = solver();
        let a = array![[1.0, 0.5], [0.2, 2.0]];
        let gamma = Arc::new(GammaRates::new(2.0, 1.0).unwrap());
        let forced =
            QuadratureSpec::new(gamma.clone(), 16, IntegrationStrategy::ClosedForm).unwrap();
        let auto = QuadratureSpec::auto(gamma, 16).unwrap();

        // Act
        let forced_out = s.integrate(a.view(), &forced);
        let auto_out = s.integrate(a.view(), &auto).unwrap();

        // Assert
        assert!(matches!(
            forced_out,
            Err(ExpmError::ClosedFormUnavailable { distribution: "gamma", .. })
        ));
        assert!(matches!(auto_out.method, SolveMethod::Quadrature { .. }));
        assert!(auto_out.matrix.iter().all(|v| v.is_finite()));
    }

    #[test]
    // Purpose
    // -------
    // Overflow in a spectral integral is reported as an error, never as a
    // NaN matrix.
    //
    // Given
    // -----
    // - A = [[1, 0.5], [0.2, 2]] with positive eigenvalues.
    // - A point mass at rate 400 (e^{836} overflows), and an interval
    //   integral to t = 400.
    //
    // Expect
    // ------
    // - Forced closed form: `ClosedFormUnavailable`.
    // - Auto and the interval integral: `ExponentiationError`.
    fn overflowing_integrals_are_errors() {
        let s = solver();
        let a = array![[1.0, 0.5], [0.2, 2.0]];
        let point = Arc::new(DiscreteRates::new(vec![400.0], vec![1.0]).unwrap());
        let forced =
            QuadratureSpec::new(point.clone(), 1, IntegrationStrategy::ClosedForm).unwrap();
        let auto = QuadratureSpec::auto(point, 1).unwrap();

        assert!(matches!(
            s.integrate(a.view(), &forced),
            Err(ExpmError::ClosedFormUnavailable { .. })
        ));
        assert!(matches!(
            s.integrate(a.view(), &auto),
            Err(ExpmError::ExponentiationError { .. })
        ));
        assert!(matches!(
            s.integrate_interval(a.view(), 400.0),
            Err(ExpmError::ExponentiationError { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // A Degenerate interval integral whose rows still sum to t but that has
    // lost the generator's off-diagonal rates falls back to Van Loan.
    //
    // Given
    // -----
    // - cluster_tol = 10 and max_residual = 10, which merge the eigenvalues
    //   of Q = [[-1e-7, 1e-7], [2e-7, -2e-7]] and accept the result as
    //   Degenerate.
    // - t = 0.01.
    //
    // Expect
    // ------
    // - Method VanLoan; (∫P)₀₁ ≈ q₀₁·t²/2 · (1 − 3e-7·t/3) to 1e-4 relative.
    fn rejected_degenerate_interval_falls_back_to_van_loan() {
        // Arrange
        let loose = StabilityTolerances::new(1e-9, 10.0, 1e-6, 1e8, 1e12, 10.0, 1e-12).unwrap();
        let cache = Arc::new(EigenCache::new(CacheOptions::default(), loose));
        let s = IntegrationSolver::new(cache, ExpmOptions::default());
        let q = array![[-1e-7, 1e-7], [2e-7, -2e-7]];
        let t = 0.01_f64;

        // Act
        let verdict = s.exponential_solver().cache().get_or_compute(q.view()).unwrap().verdict();
        let out = s.integrate_interval(q.view(), t).unwrap();

        // Assert
        assert_eq!(verdict, StabilityVerdict::Degenerate);
        assert_eq!(out.method, SolveMethod::VanLoan);
        let expected = 1e-7 * t * t / 2.0 * (1.0 - 3e-7 * t / 3.0);
        assert_relative_eq!(out.matrix[[0, 1]], expected, max_relative = 1e-4);
        assert_relative_eq!(out.matrix[[1, 0]], 2.0 * expected, max_relative = 1e-4);
        assert!(rows_sum_to(out.matrix.view(), t, 1e-12));
    }

    #[test]
    fn interval_factor_series_is_continuous() {
        let t = 1.5;
        let small = Complex64::new(1e-7, 0.0);
        let series = interval_factor(small, t);
        assert_abs_diff_eq!(series.re, t + 1e-7 * t * t / 2.0, epsilon = 1e-13);
        assert_abs_diff_eq!(interval_factor(Complex64::new(0.0, 0.0), t).re, t);
    }

    #[test]
    fn spec_rejects_bad_node_counts() {
        let dist = Arc::new(ExponentialRates::new(1.0).unwrap());
        assert!(QuadratureSpec::auto(dist.clone(), 0).is_err());
        assert!(QuadratureSpec::auto(dist, QuadratureSpec::max_nodes() + 1).is_err());
    }
}
