//! cache — shared eigendecomposition cache.
//!
//! Purpose
//! -------
//! Provide [`EigenCache`], the only shared mutable state in the crate. It is
//! an explicit object: each engine, solver set, or test owns its own instance
//! (usually behind an `Arc`), so there is no module-level singleton.
//!
//! Key behaviors
//! -------------
//! - Bounded LRU keyed by [`MatrixFingerprint`](crate::core::MatrixFingerprint).
//! - Single-flight computation per key under concurrent access.
//! - [`CacheStats`] snapshots of hits, misses, decompositions and evictions.

pub mod eigen_cache;
pub mod metrics;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::eigen_cache::{CachedDecomposition, EigenCache};
pub use self::metrics::{CacheMetrics, CacheStats};
