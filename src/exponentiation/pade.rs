//! Scaling-and-squaring Pade approximation of the matrix exponential.
//!
//! Purpose
//! -------
//! Compute `exp(A)` without an eigendecomposition, for matrices whose
//! eigenvectors are unreliable (defective or nearly so). Follows Higham
//! (2005): choose the smallest diagonal Pade degree `m ∈ {3, 5, 7, 9, 13}`
//! whose backward-error threshold `θ_m` bounds `‖A‖₁`; otherwise scale by
//! `2^-s` so that `‖A / 2^s‖₁ ≤ θ₁₃`, apply `r₁₃`, and square `s` times.
//!
//! Key behaviors
//! -------------
//! - `r_m(A) = (V − U)⁻¹ (V + U)` with `U` odd and `V` even in `A`, solved by
//!   LU rather than by forming an inverse.
//! - Refinement: attempt `k = 0` uses the optimal degree and scaling; each
//!   further attempt forces degree 13 with one more squaring. An attempt is
//!   accepted when the result is finite and, for generator inputs, is
//!   row-stochastic within `row_sum_tol`.
//! - The scaling step keeps `‖A / 2^s‖₁` bounded, so very large `t·‖Q‖`
//!   cannot overflow inside the rational approximant.
//!
//! Errors
//! ------
//! - [`ExpmError::ExponentiationError`] when every attempt fails or the
//!   required number of squarings exceeds `max_squarings`.
use crate::{
    core::options::ExpmOptions,
    errors::{ExpmError, ExpmResult},
    solve::dense::{all_finite, one_norm, solve_linear},
};
use nalgebra::DMatrix;

const THETA_3: f64 = 1.495585217958292e-2;
const THETA_5: f64 = 2.539398330063230e-1;
const THETA_7: f64 = 9.504178996162932e-1;
const THETA_9: f64 = 2.097847961257068;
const THETA_13: f64 = 5.371920351148152;

const B3: [f64; 4] = [120.0, 60.0, 12.0, 1.0];
const B5: [f64; 6] = [30240.0, 15120.0, 3360.0, 420.0, 30.0, 1.0];
const B7: [f64; 8] = [17297280.0, 8648640.0, 1995840.0, 277200.0, 25200.0, 1512.0, 56.0, 1.0];
const B9: [f64; 10] = [
    17643225600.0,
    8821612800.0,
    2075673600.0,
    302702400.0,
    30270240.0,
    2162160.0,
    110880.0,
    3960.0,
    90.0,
    1.0,
];
const B13: [f64; 14] = [
    64764752532480000.0,
    32382376266240000.0,
    7771770303897600.0,
    1187353796428800.0,
    129060195264000.0,
    10559470521600.0,
    670442572800.0,
    33522128640.0,
    1323241920.0,
    40840800.0,
    960960.0,
    16380.0,
    182.0,
    1.0,
];

/// Output of [`pade_exponential`]: the matrix and the squarings it used.
#[derive(Debug, Clone)]
pub struct PadeOutcome {
    pub matrix: DMatrix<f64>,
    pub squarings: u32,
}

/// Compute `exp(a)` by scaling and squaring.
///
/// Parameters
/// ----------
/// - `a`: `&DMatrix<f64>`
///   Finite square matrix (already multiplied by `t`).
/// - `options`: `&ExpmOptions`
///   Refinement cap, squaring cap and row-sum tolerance.
/// - `stochastic_check`: `bool`
///   When `true`, each attempt must produce a row-stochastic matrix; set it
///   for generator inputs.
///
/// Errors
/// ------
/// - [`ExpmError::ExponentiationError`] as described in the module docs.
pub fn pade_exponential(
    a: &DMatrix<f64>, options: &ExpmOptions, stochastic_check: bool,
) -> ExpmResult<PadeOutcome> {
    let norm = one_norm(a);
    if !norm.is_finite() {
        return Err(ExpmError::ExponentiationError {
            attempts: 0,
            reason: "Input norm is not finite.",
        });
    }
    let base_squarings = squarings_for(norm);
    let attempts = options.max_refinements + 1;

    for k in 0..attempts {
        let (degree, squarings) = if k == 0 {
            (degree_for(norm), base_squarings)
        } else {
            (13, base_squarings + k as u32)
        };
        if squarings > options.max_squarings {
            log::warn!(
                "pade: {squarings} squarings exceed the cap of {}",
                options.max_squarings
            );
            return Err(ExpmError::ExponentiationError {
                attempts: k,
                reason: "Required squarings exceed max_squarings.",
            });
        }

        let Some(result) = scaled_pade(a, degree, squarings) else {
            log::trace!("pade attempt {k}: singular denominator (m = {degree}, s = {squarings})");
            continue;
        };
        if accept(&result, options.row_sum_tol, stochastic_check) {
            if k > 0 {
                log::debug!("pade: accepted after {k} refinement(s), s = {squarings}");
            }
            return Ok(PadeOutcome { matrix: result, squarings });
        }
        log::trace!("pade attempt {k}: result rejected (m = {degree}, s = {squarings})");
    }

    log::warn!("pade: no attempt converged after {attempts} tries");
    Err(ExpmError::ExponentiationError {
        attempts,
        reason: "Scaling-and-squaring did not produce an acceptable result.",
    })
}

/// Smallest degree whose threshold covers `norm`; 13 when none does.
fn degree_for(norm: f64) -> usize {
    if norm <= THETA_3 {
        3
    } else if norm <= THETA_5 {
        5
    } else if norm <= THETA_7 {
        7
    } else if norm <= THETA_9 {
        9
    } else {
        13
    }
}

/// Squarings `s` needed for degree 13: `max(0, ⌈log₂(norm / θ₁₃)⌉)`.
fn squarings_for(norm: f64) -> u32 {
    if norm <= THETA_13 {
        return 0;
    }
    (norm / THETA_13).log2().ceil().max(0.0) as u32
}

fn scaled_pade(a: &DMatrix<f64>, degree: usize, squarings: u32) -> Option<DMatrix<f64>> {
    let scaled = if squarings == 0 { a.clone() } else { a * 2f64.powi(-(squarings as i32)) };
    let mut r = pade_approximant(&scaled, degree)?;
    for _ in 0..squarings {
        r = &r * &r;
    }
    Some(r)
}

fn pade_approximant(a: &DMatrix<f64>, degree: usize) -> Option<DMatrix<f64>> {
    let n = a.nrows();
    let ident = DMatrix::<f64>::identity(n, n);
    let a2 = a * a;

    let (u, v) = if degree == 13 {
        let a4 = &a2 * &a2;
        let a6 = &a4 * &a2;
        let b = &B13;
        let u_inner = &a6 * (&a6 * b[13] + &a4 * b[11] + &a2 * b[9])
            + &a6 * b[7]
            + &a4 * b[5]
            + &a2 * b[3]
            + &ident * b[1];
        let u = a * u_inner;
        let v = &a6 * (&a6 * b[12] + &a4 * b[10] + &a2 * b[8])
            + &a6 * b[6]
            + &a4 * b[4]
            + &a2 * b[2]
            + &ident * b[0];
        (u, v)
    } else {
        let b: &[f64] = match degree {
            3 => &B3,
            5 => &B5,
            7 => &B7,
            _ => &B9,
        };
        // Even powers I, A², A⁴, ... up to A^(m-1).
        let mut powers = vec![ident, a2];
        while powers.len() < (degree + 1) / 2 {
            let next = &powers[powers.len() - 1] * &powers[1];
            powers.push(next);
        }
        let mut u_inner = DMatrix::<f64>::zeros(n, n);
        let mut v = DMatrix::<f64>::zeros(n, n);
        for (j, p) in powers.iter().enumerate() {
            u_inner += p * b[2 * j + 1];
            v += p * b[2 * j];
        }
        (a * u_inner, v)
    };

    solve_linear(&(&v - &u), &(&v + &u))
}

fn accept(result: &DMatrix<f64>, row_sum_tol: f64, stochastic_check: bool) -> bool {
    if !all_finite(result) {
        return false;
    }
    if !stochastic_check {
        return true;
    }
    result.row_iter().all(|row| {
        let scale = row.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
        (row.sum() - 1.0).abs() <= row_sum_tol * scale && row.iter().all(|&v| v >= -row_sum_tol)
    })
}
