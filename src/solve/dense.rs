//! Dense linear-algebra helpers and the ndarray ↔ nalgebra bridge.
//!
//! Purpose
//! -------
//! Keep the public surface of the crate in `ndarray` while doing the
//! factorizations (LU, SVD, eigen) in `nalgebra`. Every conversion copies;
//! matrices here are small (typically 4–64 states) so the copy is negligible
//! next to the O(n³) work that follows.
//!
//! Key behaviors
//! -------------
//! - [`to_dmatrix`] / [`to_array`] copy between the two matrix types.
//! - [`complexify`] / [`real_part`] move between real and complex storage.
//! - [`solve_linear`] and [`try_inverse_complex`] wrap nalgebra's LU.
//! - [`one_norm`], [`inf_norm`], [`max_abs`] and [`reciprocal_condition`]
//!   provide the norms used by degree selection and the stability checks.
//!
//! Conventions
//! -----------
//! - Helpers that may fail numerically return `Option`; callers map `None`
//!   to the appropriate [`ExpmError`](crate::errors::ExpmError) variant.
use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;

/// Copy an `ndarray` view into a freshly allocated `DMatrix<f64>`.
///
/// Writes run column by column to match `DMatrix`'s column-major layout.
pub fn to_dmatrix(a: ArrayView2<'_, f64>) -> DMatrix<f64> {
    let (rows, cols) = a.dim();
    let mut out = DMatrix::<f64>::zeros(rows, cols);
    for j in 0..cols {
        for i in 0..rows {
            out[(i, j)] = a[[i, j]];
        }
    }
    out
}

/// Copy a `DMatrix<f64>` back into a row-major `Array2<f64>`.
pub fn to_array(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

pub fn complexify(m: &DMatrix<f64>) -> DMatrix<Complex64> {
    m.map(|v| Complex64::new(v, 0.0))
}

pub fn real_part(m: &DMatrix<Complex64>) -> DMatrix<f64> {
    m.map(|z| z.re)
}

/// Largest absolute imaginary part of any entry.
pub fn max_imag(m: &DMatrix<Complex64>) -> f64 {
    m.iter().fold(0.0_f64, |acc, z| acc.max(z.im.abs()))
}

/// Largest absolute entry of a real matrix.
pub fn max_abs(m: &DMatrix<f64>) -> f64 {
    m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

/// Matrix 1-norm (maximum absolute column sum).
pub fn one_norm(m: &DMatrix<f64>) -> f64 {
    m.column_iter().map(|c| c.iter().map(|v| v.abs()).sum::<f64>()).fold(0.0_f64, f64::max)
}

/// Matrix ∞-norm (maximum absolute row sum).
pub fn inf_norm(m: &DMatrix<f64>) -> f64 {
    m.row_iter().map(|r| r.iter().map(|v| v.abs()).sum::<f64>()).fold(0.0_f64, f64::max)
}

/// Whether every entry is finite.
pub fn all_finite(m: &DMatrix<f64>) -> bool {
    m.iter().all(|v| v.is_finite())
}

pub fn all_finite_complex(m: &DMatrix<Complex64>) -> bool {
    m.iter().all(|z| z.re.is_finite() && z.im.is_finite())
}

/// Solve `A·X = B` by LU with partial pivoting.
///
/// Returns `None` when `A` is singular to working precision.
pub fn solve_linear(a: &DMatrix<f64>, b: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    a.clone().lu().solve(b)
}

/// Inverse of a complex square matrix by LU, or `None` if singular.
pub fn try_inverse_complex(m: &DMatrix<Complex64>) -> Option<DMatrix<Complex64>> {
    m.clone().lu().try_inverse()
}

/// Reciprocal 2-norm condition number `σ_min / σ_max` of a complex matrix.
///
/// Returns `0.0` for the zero matrix and `NaN` when the SVD produced
/// non-finite singular values.
pub fn reciprocal_condition(m: &DMatrix<Complex64>) -> f64 {
    let sv = m.singular_values();
    if sv.iter().any(|s| !s.is_finite()) {
        return f64::NAN;
    }
    let max = sv.iter().fold(0.0_f64, |acc, &s| acc.max(s));
    if max == 0.0 {
        return 0.0;
    }
    let min = sv.iter().fold(f64::INFINITY, |acc, &s| acc.min(s));
    min / max
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Lossless copies between ndarray and nalgebra.
    // - LU-based solves and inverses.
    // - Norm and condition-number helpers.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Copying into a `DMatrix` and back must preserve every entry and the
    // row/column orientation of a non-symmetric matrix.
    fn bridge_preserves_orientation() {
        let a = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let m = to_dmatrix(a.view());
        assert_eq!(m.nrows(), 2);
        assert_eq!(m[(0, 2)], 3.0);
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(to_array(&m), a);
    }

    #[test]
    // Purpose
    // -------
    // `solve_linear` recovers a known solution and reports singular systems.
    //
    // Given
    // -----
    // - A = [[2, 1], [1, 3]], X = [[1], [2]], B = A·X.
    // - A singular matrix [[1, 2], [2, 4]].
    //
    // Expect
    // ------
    // - The solution matches X; the singular system yields `None`.
    fn solve_linear_recovers_solution() {
        // Arrange
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        let b = &a * &x;
        let singular = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);

        // Act
        let solved = solve_linear(&a, &b).unwrap();

        // Assert
        assert_abs_diff_eq!(solved[(0, 0)], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(solved[(1, 0)], 2.0, epsilon = 1e-12);
        assert!(solve_linear(&singular, &b).is_none());
    }

    #[test]
    fn norms_and_condition() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, -4.0, 2.0, 3.0]);
        assert_abs_diff_eq!(one_norm(&m), 7.0);
        assert_abs_diff_eq!(inf_norm(&m), 5.0);
        assert_abs_diff_eq!(max_abs(&m), 4.0);

        let diag = complexify(&DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 8.0]));
        assert_abs_diff_eq!(reciprocal_condition(&diag), 0.25, epsilon = 1e-12);
        assert_eq!(reciprocal_condition(&complexify(&DMatrix::zeros(2, 2))), 0.0);
    }

    #[test]
    fn complex_inverse_of_rotation() {
        let r = DMatrix::from_row_slice(
            2,
            2,
            &[
                Complex64::new(0.0, 1.0),
                Complex64::new(1.0, 0.0),
                Complex64::new(1.0, 0.0),
                Complex64::new(0.0, 1.0),
            ],
        );
        let inv = try_inverse_complex(&r).unwrap();
        let prod = &r * &inv;
        assert_abs_diff_eq!(prod[(0, 0)].re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(prod[(0, 1)].norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(max_imag(&prod), 0.0, epsilon = 1e-12);
    }
}
