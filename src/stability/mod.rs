//! stability — Stable / Degenerate / Defective classification.
//!
//! Purpose
//! -------
//! Classify eigendecompositions so the solvers can select a strategy by
//! matching on a tagged verdict instead of re-deriving numerical judgements.
//!
//! Downstream usage
//! ----------------
//! - [`EigenCache`](crate::cache::EigenCache) runs [`assess`] once per
//!   decomposition and stores the [`StabilityReport`] next to it.
//! - Solvers read `report.verdict`; the remaining fields are diagnostics.

pub mod guard;

pub use self::guard::{StabilityReport, StabilityVerdict, assess, classify};
