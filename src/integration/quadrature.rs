//! Gaussian quadrature rules by the Golub–Welsch algorithm.
//!
//! Purpose
//! -------
//! Supply the node/weight sets used to integrate `exp(Q·t)` against a rate
//! density when no closed form is available. Nodes are the eigenvalues of
//! the symmetric tridiagonal Jacobi matrix of the orthogonal-polynomial
//! family; weights are the squared first components of its normalised
//! eigenvectors, which makes them sum to one (probability weights).
//!
//! Key behaviors
//! -------------
//! - [`gauss_laguerre`]: generalised Gauss–Laguerre for densities
//!   `x^α e^{-x} / Γ(α+1)` on `[0, ∞)` (exponential and gamma rates).
//!   Jacobi matrix: diagonal `2i + α + 1`, off-diagonal `√(i (i + α))`.
//! - [`gauss_legendre`]: Gauss–Legendre for the uniform density on
//!   `[-1, 1]`. Jacobi matrix: diagonal 0, off-diagonal `i / √(4i² − 1)`.
//! - An `n`-node rule integrates polynomials of degree `≤ 2n − 1` exactly.
//!
//! Conventions
//! -----------
//! - Node counts are limited to `1..=MAX_QUADRATURE_NODES`.
//! - Nodes are returned in ascending order.
use crate::errors::{ExpmError, ExpmResult};
use nalgebra::DMatrix;

/// Largest supported quadrature node count.
pub const MAX_QUADRATURE_NODES: usize = 200;

/// Nodes and probability weights of a quadrature rule.
///
/// Invariants
/// ----------
/// - `nodes.len() == weights.len() >= 1`.
/// - Nodes are finite; weights are finite, non-negative and sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule {
    nodes: Vec<f64>,
    weights: Vec<f64>,
}

impl QuadratureRule {
    /// Build a rule from raw nodes and non-negative weights, normalising the
    /// weights to sum to one.
    ///
    /// # Errors
    /// - [`ExpmError::DimensionMismatch`] if the lengths differ.
    /// - [`ExpmError::InvalidNodeCount`] if the rule is empty.
    /// - [`ExpmError::InvalidDistributionParam`] for non-finite nodes or
    ///   negative / non-finite / all-zero weights.
    pub fn new(nodes: Vec<f64>, weights: Vec<f64>) -> ExpmResult<Self> {
        if nodes.len() != weights.len() {
            return Err(ExpmError::DimensionMismatch {
                expected: nodes.len(),
                found: weights.len(),
            });
        }
        if nodes.is_empty() {
            return Err(ExpmError::InvalidNodeCount {
                nodes: 0,
                reason: "Quadrature rule needs at least one node.",
            });
        }
        if let Some(&bad) = nodes.iter().find(|v| !v.is_finite()) {
            return Err(ExpmError::InvalidDistributionParam {
                name: "node",
                value: bad,
                reason: "Quadrature nodes must be finite.",
            });
        }
        if let Some(&bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(ExpmError::InvalidDistributionParam {
                name: "weight",
                value: bad,
                reason: "Quadrature weights must be finite and non-negative.",
            });
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(ExpmError::InvalidDistributionParam {
                name: "weight",
                value: total,
                reason: "Quadrature weights must not all be zero.",
            });
        }
        let weights = weights.into_iter().map(|w| w / total).collect();
        Ok(Self { nodes, weights })
    }

    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Apply `t ↦ scale · t + shift` to every node.
    pub fn affine(mut self, scale: f64, shift: f64) -> Self {
        for x in &mut self.nodes {
            *x = scale * *x + shift;
        }
        self
    }

    /// `Σ w_i f(t_i)`.
    pub fn integrate<F: Fn(f64) -> f64>(&self, f: F) -> f64 {
        self.nodes.iter().zip(&self.weights).map(|(&t, &w)| w * f(t)).sum()
    }
}

/// Validate a requested node count.
///
/// # Errors
/// [`ExpmError::InvalidNodeCount`] outside `1..=MAX_QUADRATURE_NODES`.
pub fn validate_node_count(nodes: usize) -> ExpmResult<()> {
    if nodes == 0 {
        return Err(ExpmError::InvalidNodeCount {
            nodes,
            reason: "At least one quadrature node is required.",
        });
    }
    if nodes > MAX_QUADRATURE_NODES {
        return Err(ExpmError::InvalidNodeCount {
            nodes,
            reason: "Node count exceeds MAX_QUADRATURE_NODES.",
        });
    }
    Ok(())
}

/// Generalised Gauss–Laguerre rule for the density `x^α e^{-x} / Γ(α+1)`.
///
/// Parameters
/// ----------
/// - `nodes`: `usize`
///   Number of nodes, `1..=MAX_QUADRATURE_NODES`.
/// - `alpha`: `f64`
///   Exponent `α > -1`.
///
/// Errors
/// ------
/// - [`ExpmError::InvalidNodeCount`] for an unsupported node count.
/// - [`ExpmError::InvalidDistributionParam`] for `α ≤ -1` or non-finite `α`.
pub fn gauss_laguerre(nodes: usize, alpha: f64) -> ExpmResult<QuadratureRule> {
    validate_node_count(nodes)?;
    if !alpha.is_finite() || alpha <= -1.0 {
        return Err(ExpmError::InvalidDistributionParam {
            name: "alpha",
            value: alpha,
            reason: "Laguerre exponent must be finite and greater than -1.",
        });
    }
    golub_welsch(
        nodes,
        |i| 2.0 * i as f64 + alpha + 1.0,
        |i| {
            let k = i as f64;
            (k * (k + alpha)).sqrt()
        },
    )
}

/// Gauss–Legendre rule for the uniform density on `[-1, 1]`.
///
/// # Errors
/// [`ExpmError::InvalidNodeCount`] for an unsupported node count.
pub fn gauss_legendre(nodes: usize) -> ExpmResult<QuadratureRule> {
    validate_node_count(nodes)?;
    golub_welsch(
        nodes,
        |_| 0.0,
        |i| {
            let k = i as f64;
            k / (4.0 * k * k - 1.0).sqrt()
        },
    )
}

/// Eigen-solve the Jacobi matrix with diagonal `diag(i)` (i = 0..n) and
/// off-diagonal `off(i)` between rows `i - 1` and `i` (i = 1..n).
fn golub_welsch<D, O>(n: usize, diag: D, off: O) -> ExpmResult<QuadratureRule>
where
    D: Fn(usize) -> f64,
    O: Fn(usize) -> f64,
{
    let mut jacobi = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        jacobi[(i, i)] = diag(i);
        if i > 0 {
            let b = off(i);
            jacobi[(i - 1, i)] = b;
            jacobi[(i, i - 1)] = b;
        }
    }
    let eig = jacobi.symmetric_eigen();
    let mut pairs: Vec<(f64, f64)> = (0..n)
        .map(|k| (eig.eigenvalues[k], eig.eigenvectors[(0, k)].powi(2)))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (nodes, weights) = pairs.into_iter().unzip();
    QuadratureRule::new(nodes, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Known low-order nodes and weights.
    // - Exactness on moments up to degree 2n − 1.
    // - Node-count and parameter validation.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // The two-node Laguerre rule has nodes 2 ∓ √2 and weights (2 ± √2)/4.
    fn two_node_laguerre_is_exact() {
        let rule = gauss_laguerre(2, 0.0).unwrap();
        let r2 = 2.0_f64.sqrt();
        assert_abs_diff_eq!(rule.nodes()[0], 2.0 - r2, epsilon = 1e-12);
        assert_abs_diff_eq!(rule.nodes()[1], 2.0 + r2, epsilon = 1e-12);
        assert_abs_diff_eq!(rule.weights()[0], (2.0 + r2) / 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rule.weights()[1], (2.0 - r2) / 4.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A generalised Laguerre rule reproduces gamma moments.
    //
    // Given
    // -----
    // - α = 1.5, 6 nodes; E[X^k] = Γ(α+1+k)/Γ(α+1) = (α+1)(α+2)…(α+k).
    //
    // Expect
    // ------
    // - Moments k = 0..=5 within 1e-9 relative.
    fn generalised_laguerre_matches_gamma_moments() {
        let alpha = 1.5;
        let rule = gauss_laguerre(6, alpha).unwrap();
        let mut expected = 1.0;
        for k in 0..=5 {
            if k > 0 {
                expected *= alpha + k as f64;
            }
            let got = rule.integrate(|x| x.powi(k));
            assert_abs_diff_eq!(got / expected, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    // Purpose
    // -------
    // Gauss–Legendre integrates the uniform moments on [-1, 1].
    fn legendre_matches_uniform_moments() {
        let rule = gauss_legendre(5).unwrap();
        assert_abs_diff_eq!(rule.weights().iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rule.integrate(|x| x), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rule.integrate(|x| x * x), 1.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rule.integrate(|x| x.powi(8)), 1.0 / 9.0, epsilon = 1e-12);

        let shifted = rule.affine(0.5, 0.5);
        assert!(shifted.nodes().iter().all(|&x| (0.0..=1.0).contains(&x)));
    }

    #[test]
    fn invalid_requests_are_rejected() {
        assert!(matches!(gauss_legendre(0), Err(ExpmError::InvalidNodeCount { .. })));
        assert!(matches!(
            gauss_laguerre(MAX_QUADRATURE_NODES + 1, 0.0),
            Err(ExpmError::InvalidNodeCount { .. })
        ));
        assert!(gauss_laguerre(4, -1.0).is_err());
        assert!(QuadratureRule::new(vec![1.0], vec![1.0, 2.0]).is_err());
        assert!(QuadratureRule::new(vec![1.0], vec![0.0]).is_err());
    }
}
