//! EigenCache — bounded, single-flight memo of eigendecompositions.
//!
//! Purpose
//! -------
//! Decompose each distinct generator matrix once and reuse the result across
//! every time scalar it is evaluated at. Keys are exact content fingerprints,
//! so callers that rebuild an equal matrix per branch or per iteration still
//! hit the cache.
//!
//! Key behaviors
//! -------------
//! - Lookups take a short `parking_lot::Mutex` on an LRU-ordered
//!   `LinkedHashMap`: a hit refreshes the entry, a miss inserts an empty
//!   slot and evicts from the front while over `max_entries`.
//! - The lock is released before any numerical work. Each slot is an
//!   `Arc<OnceCell<..>>`; `get_or_init` runs the decomposition exactly once
//!   and blocks concurrent requesters for the same key until it finishes.
//! - Failures are memoised too: a matrix whose eigenvectors are singular
//!   returns the same
//!   [`ExpmError::DecompositionError`](crate::errors::ExpmError::DecompositionError)
//!   on every lookup without recomputation.
//! - Each stored entry carries its [`StabilityReport`], computed once.
//!
//! Invariants & assumptions
//! ------------------------
//! - `len() <= max_entries` after every lookup returns.
//! - Evicting a slot that another thread is still computing is safe: that
//!   thread holds its own `Arc` to the slot and completes normally; the
//!   result is simply not retained.
//! - One cache is bound to one set of [`StabilityTolerances`]; verdicts are
//!   never mixed across tolerance settings.
use crate::{
    cache::metrics::{CacheMetrics, CacheStats},
    core::{
        fingerprint::MatrixFingerprint,
        options::{CacheOptions, StabilityTolerances},
        validation::validate_square,
    },
    errors::ExpmResult,
    solve::eigen::{Eigendecomposition, decompose},
    stability::guard::{StabilityReport, StabilityVerdict, assess},
};
use linked_hash_map::LinkedHashMap;
use ndarray::ArrayView2;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;

type Slot = Arc<OnceCell<ExpmResult<Arc<CachedDecomposition>>>>;

/// A decomposition together with its one-time stability assessment.
#[derive(Debug, Clone)]
pub struct CachedDecomposition {
    pub decomposition: Eigendecomposition,
    pub report: StabilityReport,
}

impl CachedDecomposition {
    pub fn verdict(&self) -> StabilityVerdict {
        self.report.verdict
    }
}

/// Thread-safe LRU cache of eigendecompositions keyed by matrix content.
#[derive(Debug)]
pub struct EigenCache {
    entries: Mutex<LinkedHashMap<MatrixFingerprint, Slot>>,
    options: CacheOptions,
    tolerances: StabilityTolerances,
    metrics: CacheMetrics,
}

impl EigenCache {
    /// Create an empty cache.
    ///
    /// Both arguments are already validated by their constructors.
    pub fn new(options: CacheOptions, tolerances: StabilityTolerances) -> Self {
        Self {
            entries: Mutex::new(LinkedHashMap::new()),
            options,
            tolerances,
            metrics: CacheMetrics::new(),
        }
    }

    /// Return the cached decomposition of `matrix`, computing it on first use.
    ///
    /// Parameters
    /// ----------
    /// - `matrix`: `ArrayView2<f64>`
    ///   Finite square matrix. Content, not identity, determines the key.
    ///
    /// Returns
    /// -------
    /// `ExpmResult<Arc<CachedDecomposition>>`
    ///   Shared handle; cheap to clone and safe to keep past eviction.
    ///
    /// Errors
    /// ------
    /// - Validation errors from [`validate_square`] (not cached).
    /// - [`ExpmError::DecompositionError`](crate::errors::ExpmError::DecompositionError)
    ///   (cached) when the eigenvectors are singular to working precision.
    ///   Callers fall back to a non-spectral method.
    pub fn get_or_compute(
        &self, matrix: ArrayView2<'_, f64>,
    ) -> ExpmResult<Arc<CachedDecomposition>> {
        validate_square(matrix)?;
        let key = MatrixFingerprint::of(matrix);
        let slot = self.slot_for(key);

        slot.get_or_init(|| {
            self.metrics.record_decomposition();
            log::debug!("eigen cache: decomposing {}x{} matrix", matrix.nrows(), matrix.ncols());
            let decomposition = decompose(matrix, &self.tolerances)?;
            let report = assess(&decomposition, &self.tolerances);
            log::debug!(
                "eigen cache: verdict {:?} (residual {:e}, condition {:e}, gap {:e})",
                report.verdict,
                report.residual,
                report.condition,
                report.min_eigen_gap
            );
            Ok(Arc::new(CachedDecomposition { decomposition, report }))
        })
        .clone()
    }

    fn slot_for(&self, key: MatrixFingerprint) -> Slot {
        let mut entries = self.entries.lock();
        if let Some(slot) = entries.get_refresh(&key) {
            self.metrics.record_hit();
            return Arc::clone(slot);
        }
        self.metrics.record_miss();
        let slot: Slot = Arc::new(OnceCell::new());
        entries.insert(key, Arc::clone(&slot));
        while entries.len() > self.options.max_entries {
            if entries.pop_front().is_none() {
                break;
            }
            self.metrics.record_eviction();
            log::debug!("eigen cache: evicted least-recently-used entry");
        }
        slot
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every cached entry. Counters are kept.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn metrics(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    pub fn capacity(&self) -> usize {
        self.options.max_entries
    }

    pub fn tolerances(&self) -> &StabilityTolerances {
        &self.tolerances
    }
}

impl Default for EigenCache {
    fn default() -> Self {
        Self::new(CacheOptions::default(), StabilityTolerances::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExpmError;
    use ndarray::{Array2, array};
    use std::thread;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Hit/miss accounting and content-based keys.
    // - LRU eviction order under the capacity bound.
    // - Single-flight decomposition under concurrent first access.
    // - Memoised failures and validation errors.
    // -------------------------------------------------------------------------

    fn two_state(a: f64, b: f64) -> Array2<f64> {
        array![[-a, a], [b, -b]]
    }

    #[test]
    // Purpose
    // -------
    // Equal content built twice is one cache entry and one decomposition.
    //
    // Given
    // -----
    // - Two separately allocated copies of the same generator.
    //
    // Expect
    // ------
    // - One miss, one hit, one decomposition, the same `Arc`.
    fn equal_content_hits() {
        // Arrange
        let cache = EigenCache::default();
        let q1 = two_state(1.0, 2.0);
        let q2 = two_state(1.0, 2.0);

        // Act
        let first = cache.get_or_compute(q1.view()).unwrap();
        let second = cache.get_or_compute(q2.view()).unwrap();

        // Assert
        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.metrics();
        assert_eq!((stats.hits, stats.misses, stats.decompositions), (1, 1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    // Purpose
    // -------
    // The least-recently-used entry is evicted first; a hit refreshes order.
    //
    // Given
    // -----
    // - Capacity 2; insert A, B, touch A, insert C.
    //
    // Expect
    // ------
    // - B is evicted: looking up A is a hit, looking up B decomposes again.
    fn lru_eviction_respects_refresh() {
        let cache = EigenCache::new(CacheOptions::new(2).unwrap(), StabilityTolerances::default());
        let a = two_state(1.0, 2.0);
        let b = two_state(3.0, 1.0);
        let c = two_state(0.5, 0.25);

        cache.get_or_compute(a.view()).unwrap();
        cache.get_or_compute(b.view()).unwrap();
        cache.get_or_compute(a.view()).unwrap();
        cache.get_or_compute(c.view()).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.metrics().evictions, 1);

        let before = cache.metrics().decompositions;
        cache.get_or_compute(a.view()).unwrap();
        assert_eq!(cache.metrics().decompositions, before);
        cache.get_or_compute(b.view()).unwrap();
        assert_eq!(cache.metrics().decompositions, before + 1);
        assert!(cache.len() <= cache.capacity());
    }

    #[test]
    // Purpose
    // -------
    // Concurrent first access from many threads triggers one decomposition.
    //
    // Given
    // -----
    // - 16 threads requesting the same uncached 4-state generator.
    //
    // Expect
    // ------
    // - `decompositions == 1` and every thread sees the same `Arc`.
    fn concurrent_first_access_is_single_flight() {
        let cache = Arc::new(EigenCache::default());
        let q = array![
            [-0.9, 0.3, 0.4, 0.2],
            [0.1, -0.6, 0.2, 0.3],
            [0.25, 0.25, -0.7, 0.2],
            [0.3, 0.1, 0.1, -0.5]
        ];

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let q = q.clone();
                thread::spawn(move || cache.get_or_compute(q.view()).unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(cache.metrics().decompositions, 1);
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    // Purpose
    // -------
    // Validation errors are not cached; `clear` empties the map.
    fn invalid_input_is_rejected_and_clear_empties() {
        let cache = EigenCache::default();
        let rect = Array2::<f64>::zeros((2, 3));
        assert!(matches!(cache.get_or_compute(rect.view()), Err(ExpmError::NotSquare { .. })));
        assert!(cache.is_empty());

        cache.get_or_compute(two_state(1.0, 1.0).view()).unwrap();
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
