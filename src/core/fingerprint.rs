//! Content fingerprints for cache keys.
//!
//! A [`MatrixFingerprint`] captures the exact bit pattern of every entry
//! together with the shape, so two matrices built independently with the same
//! numbers share a key while any change to any entry yields a new one. `-0.0`
//! is folded onto `+0.0` because the two compare equal and produce identical
//! decompositions.
use ndarray::ArrayView2;

/// Exact-content key for an `f64` matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatrixFingerprint {
    rows: usize,
    cols: usize,
    bits: Box<[u64]>,
}

impl MatrixFingerprint {
    /// Fingerprint `a` in row-major order.
    pub fn of(a: ArrayView2<'_, f64>) -> Self {
        let (rows, cols) = a.dim();
        let bits = a.iter().map(|&v| if v == 0.0 { 0u64 } else { v.to_bits() }).collect();
        Self { rows, cols, bits }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}
