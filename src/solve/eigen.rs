//! General eigendecomposition `A = V·diag(λ)·V⁻¹` for real square matrices.
//!
//! Purpose
//! -------
//! Produce the spectral factors shared by the exponential, integral and
//! logarithm solvers. Generator matrices are real but generally
//! non-symmetric, so eigenvalues and eigenvectors are complex in general.
//!
//! Key behaviors
//! -------------
//! - Symmetric inputs (within `symmetry_tol`) use `SymmetricEigen`: the
//!   eigenvectors are orthonormal, `V⁻¹ = Vᵀ` and the condition number is 1.
//! - Otherwise eigenvalues come from the real Schur form
//!   (`complex_eigenvalues`). Eigenvalues within `cluster_tol` of each other
//!   (relative to the spectral radius) form one cluster sharing their mean
//!   value; the cluster's eigenvectors are the right singular vectors of
//!   `A − μI` belonging to its smallest singular values. A repeated
//!   eigenvalue with a full eigenbasis therefore decomposes cleanly, while a
//!   defective one produces vectors that fail to reconstruct `A`.
//! - `V⁻¹` comes from a complex LU inverse.
//!
//! Invariants & assumptions
//! ------------------------
//! - A returned [`Eigendecomposition`] has finite eigenvalues, finite
//!   eigenvectors and a finite inverse, and `rcond(V) ≥ f64::EPSILON`.
//! - Reconstruction accuracy is *not* guaranteed here; that judgement
//!   belongs to [`stability`](crate::stability).
//!
//! Errors
//! ------
//! - [`ExpmError::DecompositionError`] when eigenvalues are non-finite, the
//!   SVD fails to produce vectors, or `V` is singular to working precision.
use crate::{
    core::{options::StabilityTolerances, validation::validate_square},
    errors::{ExpmError, ExpmResult},
    solve::dense::{
        all_finite_complex, complexify, max_abs, real_part, reciprocal_condition, to_dmatrix,
        try_inverse_complex,
    },
};
use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;

/// Eigendecomposition — spectral factors of a real square matrix.
///
/// Fields
/// ------
/// - `values`: eigenvalues λ (cluster means for repeated eigenvalues).
/// - `vectors`: right eigenvectors as columns of `V`.
/// - `inverse`: `V⁻¹`.
/// - `original`: the decomposed matrix, kept for residual checks.
/// - `condition`: 2-norm condition number of `V`.
/// - `symmetric`: whether the symmetric eigensolver was used.
#[derive(Debug, Clone)]
pub struct Eigendecomposition {
    values: Vec<Complex64>,
    vectors: DMatrix<Complex64>,
    inverse: DMatrix<Complex64>,
    original: DMatrix<f64>,
    condition: f64,
    symmetric: bool,
}

impl Eigendecomposition {
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[Complex64] {
        &self.values
    }

    pub fn vectors(&self) -> &DMatrix<Complex64> {
        &self.vectors
    }

    pub fn inverse(&self) -> &DMatrix<Complex64> {
        &self.inverse
    }

    pub fn original(&self) -> &DMatrix<f64> {
        &self.original
    }

    /// 2-norm condition number of the eigenvector matrix.
    pub fn condition_number(&self) -> f64 {
        self.condition
    }

    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// Evaluate `V·diag(f(λ))·V⁻¹` in complex arithmetic.
    pub fn reconstruct_with<F>(&self, f: F) -> DMatrix<Complex64>
    where
        F: Fn(Complex64) -> Complex64,
    {
        let diag: Vec<Complex64> = self.values.iter().map(|&lambda| f(lambda)).collect();
        self.reconstruct_diag(&diag)
    }

    /// Evaluate `V·diag(d)·V⁻¹` for precomputed diagonal entries `d`, one
    /// per eigenvalue in the order of [`Eigendecomposition::values`].
    pub fn reconstruct_diag(&self, diag: &[Complex64]) -> DMatrix<Complex64> {
        let n = self.dim();
        let mut scaled = self.vectors.clone();
        for (j, &dj) in diag.iter().enumerate().take(n) {
            for i in 0..n {
                scaled[(i, j)] *= dj;
            }
        }
        scaled * &self.inverse
    }

    /// Evaluate `V·diag(f(λ))·V⁻¹` and split it into its real part and the
    /// largest absolute imaginary entry.
    pub fn reconstruct_real<F>(&self, f: F) -> (Array2<f64>, f64)
    where
        F: Fn(Complex64) -> Complex64,
    {
        split_real(&self.reconstruct_with(f))
    }

    /// Real-part form of [`Eigendecomposition::reconstruct_diag`].
    pub fn reconstruct_diag_real(&self, diag: &[Complex64]) -> (Array2<f64>, f64) {
        split_real(&self.reconstruct_diag(diag))
    }
}

fn split_real(full: &DMatrix<Complex64>) -> (Array2<f64>, f64) {
    let imag = full.iter().fold(0.0_f64, |acc, z| acc.max(z.im.abs()));
    let re = real_part(full);
    (Array2::from_shape_fn((re.nrows(), re.ncols()), |(i, j)| re[(i, j)]), imag)
}

/// Eigendecompose the square matrix `a`.
///
/// Parameters
/// ----------
/// - `a`: `ArrayView2<f64>`
///   Finite square matrix.
/// - `tol`: `&StabilityTolerances`
///   Supplies `symmetry_tol` and `cluster_tol`.
///
/// Returns
/// -------
/// `ExpmResult<Eigendecomposition>`
///
/// Errors
/// ------
/// - Validation errors from [`validate_square`].
/// - [`ExpmError::DecompositionError`] as described in the module docs.
pub fn decompose(
    a: ArrayView2<'_, f64>, tol: &StabilityTolerances,
) -> ExpmResult<Eigendecomposition> {
    validate_square(a)?;
    let original = to_dmatrix(a);
    if is_symmetric(&original, tol.symmetry_tol) {
        return decompose_symmetric(original);
    }
    decompose_general(original, tol.cluster_tol)
}

/// Asymmetry is measured against the largest entry, so a matrix of tiny
/// rates is not mistaken for a symmetric one.
fn is_symmetric(m: &DMatrix<f64>, symmetry_tol: f64) -> bool {
    let n = m.nrows();
    let scale = max_abs(m);
    for i in 0..n {
        for j in (i + 1)..n {
            if (m[(i, j)] - m[(j, i)]).abs() > symmetry_tol * scale {
                return false;
            }
        }
    }
    true
}

fn decompose_symmetric(original: DMatrix<f64>) -> ExpmResult<Eigendecomposition> {
    let eig = original.clone().symmetric_eigen();
    if eig.eigenvalues.iter().any(|v| !v.is_finite())
        || eig.eigenvectors.iter().any(|v| !v.is_finite())
    {
        return Err(ExpmError::DecompositionError {
            reason: "Symmetric eigensolver produced non-finite output.",
            rcond: f64::NAN,
        });
    }
    let values = eig.eigenvalues.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    let vectors = complexify(&eig.eigenvectors);
    let inverse = complexify(&eig.eigenvectors.transpose());
    Ok(Eigendecomposition { values, vectors, inverse, original, condition: 1.0, symmetric: true })
}

fn decompose_general(original: DMatrix<f64>, cluster_tol: f64) -> ExpmResult<Eigendecomposition> {
    let n = original.nrows();
    let raw: Vec<Complex64> = original.complex_eigenvalues().iter().copied().collect();
    if raw.iter().any(|z| !z.re.is_finite() || !z.im.is_finite()) {
        return Err(ExpmError::DecompositionError {
            reason: "Eigenvalues are not finite.",
            rcond: f64::NAN,
        });
    }

    let clusters = cluster_eigenvalues(&raw, cluster_tol);
    let a = complexify(&original);
    let mut values = vec![Complex64::new(0.0, 0.0); n];
    let mut vectors = DMatrix::<Complex64>::zeros(n, n);

    for cluster in &clusters {
        let mut shifted = a.clone();
        for i in 0..n {
            shifted[(i, i)] -= cluster.centre;
        }
        let svd = shifted.svd(false, true);
        let v_t = svd.v_t.ok_or(ExpmError::DecompositionError {
            reason: "SVD did not return right singular vectors.",
            rcond: f64::NAN,
        })?;
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&x, &y| svd.singular_values[x].total_cmp(&svd.singular_values[y]));

        // Rows of v_t are conjugated right singular vectors.
        for (&slot, &row) in cluster.members.iter().zip(order.iter()) {
            values[slot] = cluster.centre;
            for i in 0..n {
                vectors[(i, slot)] = v_t[(row, i)].conj();
            }
        }
    }

    let rcond = reciprocal_condition(&vectors);
    if !rcond.is_finite() || rcond < f64::EPSILON {
        return Err(ExpmError::DecompositionError {
            reason: "Eigenvector matrix is singular to working precision.",
            rcond,
        });
    }
    let inverse = try_inverse_complex(&vectors).ok_or(ExpmError::DecompositionError {
        reason: "Eigenvector matrix could not be inverted.",
        rcond,
    })?;
    if !all_finite_complex(&vectors) || !all_finite_complex(&inverse) {
        return Err(ExpmError::DecompositionError {
            reason: "Eigenvector inverse is not finite.",
            rcond,
        });
    }

    Ok(Eigendecomposition {
        values,
        vectors,
        inverse,
        original,
        condition: 1.0 / rcond,
        symmetric: false,
    })
}

#[derive(Debug)]
struct Cluster {
    centre: Complex64,
    members: Vec<usize>,
}

/// Greedy single-link grouping of eigenvalues within `cluster_tol · ρ`.
///
/// `ρ = 0` only when every eigenvalue is zero, and those still group since
/// the comparison is inclusive.
fn cluster_eigenvalues(raw: &[Complex64], cluster_tol: f64) -> Vec<Cluster> {
    let radius = raw.iter().fold(0.0_f64, |acc, z| acc.max(z.norm()));
    let threshold = cluster_tol * radius;
    let mut clusters: Vec<Cluster> = Vec::new();
    for (idx, &z) in raw.iter().enumerate() {
        match clusters
            .iter_mut()
            .find(|c| c.members.iter().any(|&m| (raw[m] - z).norm() <= threshold))
        {
            Some(cluster) => cluster.members.push(idx),
            None => clusters.push(Cluster { centre: z, members: vec![idx] }),
        }
    }
    for cluster in &mut clusters {
        let sum: Complex64 = cluster.members.iter().map(|&m| raw[m]).sum();
        cluster.centre = sum / cluster.members.len() as f64;
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solve::dense::max_imag;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Symmetric fast path and general non-symmetric path.
    // - Complex-conjugate eigenvalues of a real matrix.
    // - Repeated eigenvalues with a full eigenbasis (clustering).
    //
    // They intentionally DO NOT cover:
    // - Stable / Degenerate / Defective classification (see `stability`).
    // -------------------------------------------------------------------------

    fn reconstruction_error(d: &Eigendecomposition) -> f64 {
        let recon = real_part(&d.reconstruct_with(|z| z));
        (recon - d.original()).norm()
    }

    #[test]
    // Purpose
    // -------
    // A symmetric generator takes the symmetric path and reconstructs exactly.
    //
    // Given
    // -----
    // - Q = [[-1, 1], [1, -1]] with eigenvalues {0, -2}.
    //
    // Expect
    // ------
    // - `is_symmetric()`, condition 1, eigenvalues {0, -2}, tiny residual.
    fn symmetric_generator_uses_symmetric_path() {
        let q = array![[-1.0, 1.0], [1.0, -1.0]];
        let d = decompose(q.view(), &StabilityTolerances::default()).unwrap();

        assert!(d.is_symmetric());
        assert_eq!(d.condition_number(), 1.0);
        let mut re: Vec<f64> = d.values().iter().map(|z| z.re).collect();
        re.sort_by(f64::total_cmp);
        assert_abs_diff_eq!(re[0], -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(re[1], 0.0, epsilon = 1e-12);
        assert!(reconstruction_error(&d) < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A non-symmetric generator with distinct real eigenvalues reconstructs
    // through the general path.
    fn nonsymmetric_generator_reconstructs() {
        let q = array![[-0.3, 0.2, 0.1], [0.4, -0.5, 0.1], [0.05, 0.15, -0.2]];
        let d = decompose(q.view(), &StabilityTolerances::default()).unwrap();

        assert!(!d.is_symmetric());
        assert!(d.condition_number().is_finite());
        assert!(reconstruction_error(&d) < 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // A cyclic generator has a complex-conjugate eigenvalue pair; the
    // reconstruction must still be real.
    //
    // Given
    // -----
    // - The 3-cycle Q with rates 1: eigenvalues 0 and -3/2 ± (√3/2)i.
    //
    // Expect
    // ------
    // - Non-zero imaginary eigenvalues and a real reconstruction of Q.
    fn cyclic_generator_has_complex_pair() {
        let q = array![[-1.0, 1.0, 0.0], [0.0, -1.0, 1.0], [1.0, 0.0, -1.0]];
        let d = decompose(q.view(), &StabilityTolerances::default()).unwrap();

        let max_im = d.values().iter().fold(0.0_f64, |acc, z| acc.max(z.im.abs()));
        assert_abs_diff_eq!(max_im, 3.0_f64.sqrt() / 2.0, epsilon = 1e-10);
        assert!(reconstruction_error(&d) < 1e-10);
        assert!(max_imag(&d.reconstruct_with(|z| z)) < 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Repeated eigenvalues with a full eigenbasis share one cluster and still
    // reconstruct the matrix.
    //
    // Given
    // -----
    // - An upper-triangular matrix with eigenvalues {-1, -1, -3} where
    //   `A + I` has rank one, so -1 has two independent eigenvectors.
    //
    // Expect
    // ------
    // - Two eigenvalues exactly equal (cluster mean) and a small residual.
    fn repeated_eigenvalue_with_full_basis() {
        let a = array![[-1.0, 0.0, 0.0], [0.0, -1.0, -2.0], [0.0, 0.0, -3.0]];
        let d = decompose(a.view(), &StabilityTolerances::default()).unwrap();

        let near_minus_one = d.values().iter().filter(|z| (z.re + 1.0).abs() < 1e-8).count();
        assert_eq!(near_minus_one, 2);
        assert!(reconstruction_error(&d) < 1e-10);
    }

    #[test]
    fn clustering_groups_close_values() {
        let raw = [
            Complex64::new(-1.0, 0.0),
            Complex64::new(-1.0 - 1e-9, 0.0),
            Complex64::new(0.0, 0.0),
        ];
        let clusters = cluster_eigenvalues(&raw, 1e-6);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members, vec![0, 1]);
        assert_abs_diff_eq!(clusters[0].centre.re, -1.0 - 5e-10, epsilon = 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Clustering is relative to the spectral radius, so the distinct
    // eigenvalues of a slow generator are not merged.
    //
    // Given
    // -----
    // - Eigenvalues {0, −3e-7} and an all-zero spectrum.
    // - Q = [[-1e-7, 1e-7], [2e-7, -2e-7]].
    //
    // Expect
    // ------
    // - Two clusters for the slow spectrum, one for the zero spectrum.
    // - Q takes the general path and reconstructs to 1e-12 relative.
    fn slow_spectrum_is_not_merged() {
        let slow = [Complex64::new(0.0, 0.0), Complex64::new(-3e-7, 0.0)];
        let zero = [Complex64::new(0.0, 0.0); 3];
        assert_eq!(cluster_eigenvalues(&slow, 1e-6).len(), 2);
        assert_eq!(cluster_eigenvalues(&zero, 1e-6).len(), 1);

        let q = array![[-1e-7, 1e-7], [2e-7, -2e-7]];
        let d = decompose(q.view(), &StabilityTolerances::default()).unwrap();

        assert!(!d.is_symmetric());
        assert!(reconstruction_error(&d) < 1e-12 * d.original().norm());
        let mut re: Vec<f64> = d.values().iter().map(|z| z.re).collect();
        re.sort_by(f64::total_cmp);
        assert_abs_diff_eq!(re[0], -3e-7, epsilon = 1e-18);
        assert_abs_diff_eq!(re[1], 0.0, epsilon = 1e-18);
    }
}
