//! Reproducible, deduplicated random samples of category combinations, and
//! prompt templates rendered against them.
//!
//! The sampling engine lives in [`sampler`]; [`dict`] loads category
//! dictionaries, [`template`] parses and renders prompts, and [`prompt`]
//! glues the three together.

pub mod config;
pub mod dict;
mod paths;
pub mod prompt;
pub mod sampler;
pub mod template;

pub use dict::CategoryDictionary;
pub use prompt::PromptPermutator;
pub use sampler::{
    Combination, DrawStrategy, ReseedPolicy, Sampler, SamplerOptions, SpaceError, SpaceModel,
};
