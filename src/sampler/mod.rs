//! Unique random sampling over the Cartesian product of category values.
//!
//! [`SpaceModel`] describes the product, [`UniqueSampler`] draws never-repeating
//! index tuples from it, and [`Sampler`] puts that state behind a lock so any
//! number of threads can drain one space without overlap.

pub mod cursor;
pub mod fingerprint;
pub mod guard;
pub mod space;
pub mod unique;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cursor::{Batches, Cursor};
pub use fingerprint::{Fingerprint, fingerprint};
pub use guard::Sampler;
pub use space::{Combination, CombinationIndex, SpaceModel};
pub use unique::UniqueSampler;

/// Largest capacity the `auto` strategy will materialize and shuffle.
pub const DEFAULT_SHUFFLE_THRESHOLD: u64 = 1 << 16;

/// Hard ceiling on `shuffle_threshold`: 2^24 ranks, 128 MiB of `u64`s.
pub const MAX_SHUFFLE_THRESHOLD: u64 = 1 << 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpaceError {
    #[error("category dictionary has no categories")]
    NoCategories,
    #[error("category name must not be empty")]
    EmptyCategoryName,
    #[error("category {category:?} lists value {value:?} more than once")]
    DuplicateValue { category: String, value: String },
    #[error("number of combinations does not fit in 64 bits")]
    CapacityOverflow,
}

/// How new combinations are picked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DrawStrategy {
    /// Shuffle when the space is at most `shuffle_threshold`, else reject.
    #[default]
    Auto,
    /// Draw random tuples, discard those already seen.
    Rejection,
    /// Materialize every rank and shuffle once per reset.
    Shuffle,
}

/// What `reset` does to the random generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReseedPolicy {
    /// Reuse the original seed: every cycle yields the same sequence.
    Replay,
    /// Derive a new seed from the running generator.
    #[default]
    Fresh,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SamplerOptions {
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub strategy: DrawStrategy,
    pub reseed: ReseedPolicy,
    pub shuffle_threshold: u64,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            seed: None,
            strategy: DrawStrategy::default(),
            reseed: ReseedPolicy::default(),
            shuffle_threshold: DEFAULT_SHUFFLE_THRESHOLD,
        }
    }
}

impl SamplerOptions {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn with_strategy(mut self, strategy: DrawStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_reseed(mut self, reseed: ReseedPolicy) -> Self {
        self.reseed = reseed;
        self
    }
}
