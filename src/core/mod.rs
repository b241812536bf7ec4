//! core — options, validation, and generator-matrix primitives.
//!
//! Purpose
//! -------
//! Hold the building blocks shared by every solver: validated configuration
//! structs, input validation for matrices and time scalars, generator and
//! stochastic-matrix checks, and the content fingerprints used as cache keys.
//!
//! Key behaviors
//! -------------
//! - [`options`] defines [`StabilityTolerances`], [`ExpmOptions`],
//!   [`LogarithmOptions`], [`CacheOptions`] and [`EngineOptions`].
//! - [`validation`] rejects empty, non-square and non-finite inputs.
//! - [`generator`] checks the generator (rows sum to zero) and stochastic
//!   (rows sum to one) invariants.
//! - [`fingerprint`] builds exact-content keys for [`EigenCache`](crate::cache::EigenCache).
//!
//! Invariants & assumptions
//! ------------------------
//! - Nothing in this module performs numerical linear algebra; it is cheap
//!   enough to run on every call.
//! - Options are immutable once constructed and passed down explicitly.
//!
//! Downstream usage
//! ----------------
//! - Most callers only need `use rust_expm::core::prelude::*;`.

pub mod fingerprint;
pub mod generator;
pub mod options;
pub mod validation;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::fingerprint::MatrixFingerprint;
pub use self::generator::{
    GeneratorMatrix, is_stochastic, is_valid_generator, rows_sum_to, validate_generator,
};
pub use self::options::{
    CacheOptions, DEFAULT_CACHE_ENTRIES, EngineOptions, ExpmOptions, LogarithmOptions,
    StabilityTolerances,
};
pub use self::validation::{validate_square, validate_time, verify_tolerance};

pub mod prelude {
    pub use super::generator::{
        GeneratorMatrix, is_stochastic, is_valid_generator, validate_generator,
    };
    pub use super::options::{
        CacheOptions, EngineOptions, ExpmOptions, LogarithmOptions, StabilityTolerances,
    };
}
