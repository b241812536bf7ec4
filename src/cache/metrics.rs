//! Lock-free counters for [`EigenCache`](super::EigenCache).
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic cache counters, updated with relaxed ordering.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    decompositions: AtomicU64,
    evictions: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decomposition(&self) {
        self.decompositions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            decompositions: self.decompositions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Plain-value snapshot of [`CacheMetrics`].
///
/// - `hits`: lookups that found an existing slot (including slots still
///   being computed by another thread).
/// - `misses`: lookups that created a new slot.
/// - `decompositions`: eigendecompositions actually run.
/// - `evictions`: slots dropped by the LRU bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub decompositions: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups served without creating a slot; `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_into_snapshot() {
        let m = CacheMetrics::new();
        m.record_miss();
        m.record_decomposition();
        m.record_hit();
        m.record_hit();
        m.record_hit();
        m.record_eviction();

        let s = m.snapshot();
        assert_eq!(s, CacheStats { hits: 3, misses: 1, decompositions: 1, evictions: 1 });
        assert_eq!(s.hit_rate(), 0.75);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
