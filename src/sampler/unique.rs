use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use tracing::{debug, warn};

use crate::sampler::fingerprint::{Fingerprint, FingerprintSet, fingerprint};
use crate::sampler::space::{CombinationIndex, SpaceModel};
use crate::sampler::{DrawStrategy, MAX_SHUFFLE_THRESHOLD, ReseedPolicy, SamplerOptions};

/// Strategy after `Auto` has been resolved against the space's capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolved {
    Rejection,
    Shuffle,
}

/// Unsynchronized unique-draw engine.
///
/// Owns the seen set, the remaining budget and the random generator. Wrap it
/// in [`Sampler`](crate::sampler::Sampler) to share it between threads.
pub struct UniqueSampler {
    space: Arc<SpaceModel>,
    strategy: Resolved,
    reseed: ReseedPolicy,
    seed: u64,
    rng: SmallRng,
    seen: FingerprintSet,
    remaining: u64,
    /// Unvisited ranks, consumed from the back. Only used by `Shuffle`.
    order: Vec<u64>,
}

impl UniqueSampler {
    pub fn new(space: Arc<SpaceModel>, options: &SamplerOptions) -> Self {
        let strategy = resolve(options, space.capacity());
        let seed = options.seed.unwrap_or_else(rand::random);
        let mut sampler = Self {
            remaining: space.capacity(),
            space,
            strategy,
            reseed: options.reseed,
            seed,
            rng: SmallRng::seed_from_u64(seed),
            seen: FingerprintSet::new(),
            order: Vec::new(),
        };
        sampler.prepare_order();
        debug!(
            capacity = sampler.space.capacity(),
            categories = sampler.space.category_count(),
            strategy = ?sampler.strategy,
            seed,
            "sampler ready"
        );
        sampler
    }

    pub fn space(&self) -> &Arc<SpaceModel> {
        &self.space
    }

    /// Seed of the current cycle.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn capacity(&self) -> u64 {
        self.space.capacity()
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Distinct combinations handed out since the last reset.
    pub fn drawn(&self) -> u64 {
        self.capacity() - self.remaining
    }

    pub fn has_next(&self) -> bool {
        self.remaining > 0
    }

    /// Up to `n` combinations never returned since the last reset.
    ///
    /// The request is clamped to `remaining`, so the result is short (or
    /// empty) once the space runs out.
    pub fn draw_indices(&mut self, n: usize) -> Vec<CombinationIndex> {
        let target = self.remaining.min(n as u64) as usize;
        let mut out = Vec::with_capacity(target);
        for _ in 0..target {
            let index = match self.strategy {
                Resolved::Rejection => self.next_rejection(),
                Resolved::Shuffle => self.next_shuffled(),
            };
            self.remaining -= 1;
            out.push(index);
        }
        if n > 0 && self.remaining == 0 {
            debug!(capacity = self.capacity(), "combination space exhausted");
        }
        out
    }

    pub fn take_index(&mut self) -> Option<CombinationIndex> {
        self.draw_indices(1).pop()
    }

    /// Forget everything drawn so far.
    pub fn reset(&mut self) {
        if self.reseed == ReseedPolicy::Fresh {
            self.seed = self.rng.next_u64();
        }
        self.rng = SmallRng::seed_from_u64(self.seed);
        self.seen.clear();
        self.remaining = self.capacity();
        self.prepare_order();
        debug!(seed = self.seed, policy = ?self.reseed, "sampler reset");
    }

    /// Rejection loop. Callers guarantee `remaining > 0` and fingerprints are
    /// exact, so an unseen tuple exists and the loop ends.
    fn next_rejection(&mut self) -> CombinationIndex {
        loop {
            let index = self.space.random_index(&mut self.rng);
            if self.seen.insert(fingerprint(&self.space, &index)) {
                return index;
            }
        }
    }

    fn next_shuffled(&mut self) -> CombinationIndex {
        let rank = self
            .order
            .pop()
            .expect("shuffled order shorter than remaining count");
        self.seen.insert(Fingerprint(rank));
        self.space.unrank(rank)
    }

    fn prepare_order(&mut self) {
        self.order.clear();
        if self.strategy == Resolved::Shuffle {
            let capacity = self.capacity();
            self.order.extend(0..capacity);
            self.order.shuffle(&mut self.rng);
        }
    }
}

fn resolve(options: &SamplerOptions, capacity: u64) -> Resolved {
    if options.shuffle_threshold > MAX_SHUFFLE_THRESHOLD {
        warn!(
            requested = options.shuffle_threshold,
            max = MAX_SHUFFLE_THRESHOLD,
            "shuffle threshold capped"
        );
    }
    let threshold = options.shuffle_threshold.min(MAX_SHUFFLE_THRESHOLD);
    let fits = capacity <= threshold;
    match options.strategy {
        DrawStrategy::Rejection => Resolved::Rejection,
        DrawStrategy::Auto if fits => Resolved::Shuffle,
        DrawStrategy::Auto => Resolved::Rejection,
        DrawStrategy::Shuffle if fits => Resolved::Shuffle,
        DrawStrategy::Shuffle => {
            warn!(
                capacity,
                threshold,
                "space too large to shuffle, falling back to rejection sampling"
            );
            Resolved::Rejection
        }
    }
}
