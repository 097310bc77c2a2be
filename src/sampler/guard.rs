use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::dict::CategoryDictionary;
use crate::sampler::cursor::{Batches, Cursor};
use crate::sampler::space::{Combination, SpaceModel};
use crate::sampler::unique::UniqueSampler;
use crate::sampler::{SamplerOptions, SpaceError};

/// Thread-safe handle over one exhaustible combination space.
///
/// Every operation that reads or changes sampler state takes the same lock,
/// so concurrent callers see a single stream: nothing is handed out twice
/// between resets and the total never exceeds [`capacity`](Self::capacity).
/// Tuples are chosen under the lock and decoded after it is released.
pub struct Sampler {
    space: Arc<SpaceModel>,
    state: Mutex<UniqueSampler>,
}

impl Sampler {
    pub fn new(dict: &CategoryDictionary) -> Result<Self, SpaceError> {
        Self::with_options(dict, SamplerOptions::default())
    }

    pub fn with_options(
        dict: &CategoryDictionary,
        options: SamplerOptions,
    ) -> Result<Self, SpaceError> {
        let space = Arc::new(SpaceModel::new(dict)?);
        let state = UniqueSampler::new(Arc::clone(&space), &options);
        Ok(Self {
            space,
            state: Mutex::new(state),
        })
    }

    pub fn space(&self) -> &SpaceModel {
        &self.space
    }

    pub fn capacity(&self) -> u64 {
        self.space.capacity()
    }

    pub fn remaining(&self) -> u64 {
        self.lock().remaining()
    }

    pub fn has_next(&self) -> bool {
        self.lock().has_next()
    }

    /// Seed of the current cycle; pass it back in to replay a run.
    pub fn seed(&self) -> u64 {
        self.lock().seed()
    }

    /// Up to `n` combinations not returned to anyone since the last reset.
    pub fn draw_batch(&self, n: usize) -> Vec<Combination> {
        let indices = self.lock().draw_indices(n);
        indices.iter().map(|index| self.space.decode(index)).collect()
    }

    /// One unseen combination, or `None` once the space is exhausted.
    pub fn take_one(&self) -> Option<Combination> {
        let index = self.lock().take_index()?;
        Some(self.space.decode(&index))
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Single-step view over the shared stream.
    pub fn iter(&self) -> Cursor<'_> {
        Cursor::new(self)
    }

    /// Batch view over the shared stream; stops at the first empty batch.
    pub fn batches(&self, size: usize) -> Batches<'_> {
        Batches::new(self, size)
    }

    // State is committed one combination at a time, so a poisoned lock still
    // guards a consistent seen set and budget.
    fn lock(&self) -> MutexGuard<'_, UniqueSampler> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<'a> IntoIterator for &'a Sampler {
    type Item = Combination;
    type IntoIter = Cursor<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn people() -> CategoryDictionary {
        crate::dict::parse(
            r#"{
                "Name": ["Franz", "Hans", "Peter"],
                "Food": ["Pizza", "Pasta", "Burger"],
                "Color": ["Green", "Blue", "Red"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_oversized_batch_returns_the_whole_space() {
        let sampler = Sampler::with_options(&people(), SamplerOptions::seeded(1)).unwrap();
        assert_eq!(sampler.capacity(), 27);
        let all = sampler.draw_batch(1000);
        assert_eq!(all.len(), 27);
        assert_eq!(all.iter().collect::<HashSet<_>>().len(), 27);
        assert!(sampler.draw_batch(1).is_empty());
    }

    #[test]
    fn test_consecutive_batches_split_the_space() {
        let sampler = Sampler::with_options(&people(), SamplerOptions::seeded(2)).unwrap();
        let a = sampler.draw_batch(10);
        let b = sampler.draw_batch(10);
        let c = sampler.draw_batch(10);
        assert_eq!((a.len(), b.len(), c.len()), (10, 10, 7));
        assert_eq!(sampler.remaining(), 0);
        let unique: HashSet<_> = a.iter().chain(&b).chain(&c).collect();
        assert_eq!(unique.len(), 27);
    }

    #[test]
    fn test_decoded_combinations_cover_every_category() {
        let sampler = Sampler::with_options(&people(), SamplerOptions::seeded(3)).unwrap();
        let combo = sampler.take_one().unwrap();
        assert_eq!(
            combo.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["Color", "Food", "Name"]
        );
        assert!(people()["Food"].contains(&combo["Food"]));
    }

    #[test]
    fn test_reset_refills_the_budget() {
        let sampler = Sampler::with_options(&people(), SamplerOptions::seeded(4)).unwrap();
        let first: HashSet<_> = sampler.draw_batch(27).into_iter().collect();
        assert!(!sampler.has_next());
        sampler.reset();
        assert_eq!(sampler.remaining(), sampler.capacity());
        let second: HashSet<_> = sampler.draw_batch(27).into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_capacity_space_is_not_an_error() {
        let mut dict = people();
        dict.insert("Drink".into(), Vec::new());
        let sampler = Sampler::new(&dict).unwrap();
        assert_eq!(sampler.capacity(), 0);
        assert!(!sampler.has_next());
        assert!(sampler.take_one().is_none());
        assert!(sampler.draw_batch(10).is_empty());
    }

    #[test]
    fn test_sampler_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Sampler>();
    }
}
