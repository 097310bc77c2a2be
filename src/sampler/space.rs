use std::collections::{BTreeMap, HashSet};

use rand::Rng;

use crate::dict::CategoryDictionary;
use crate::sampler::SpaceError;

/// One decoded combination: category name to the chosen value.
pub type Combination = BTreeMap<String, String>;

/// One index per category, in the space's category order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CombinationIndex(pub Vec<usize>);

impl CombinationIndex {
    pub fn components(&self) -> &[usize] {
        &self.0
    }
}

/// The Cartesian product implied by a category dictionary.
///
/// Immutable after construction. Category order is the dictionary's key
/// order and defines tuple positions for the lifetime of the model.
#[derive(Clone, Debug)]
pub struct SpaceModel {
    categories: Vec<String>,
    values: Vec<Vec<String>>,
    domain_sizes: Vec<usize>,
    capacity: u64,
}

impl SpaceModel {
    pub fn new(dict: &CategoryDictionary) -> Result<Self, SpaceError> {
        if dict.is_empty() {
            return Err(SpaceError::NoCategories);
        }

        let mut categories = Vec::with_capacity(dict.len());
        let mut values = Vec::with_capacity(dict.len());
        for (category, candidates) in dict {
            if category.is_empty() {
                return Err(SpaceError::EmptyCategoryName);
            }
            let mut unique = HashSet::with_capacity(candidates.len());
            if let Some(dup) = candidates.iter().find(|v| !unique.insert(v.as_str())) {
                return Err(SpaceError::DuplicateValue {
                    category: category.clone(),
                    value: dup.clone(),
                });
            }
            categories.push(category.clone());
            values.push(candidates.clone());
        }

        let domain_sizes: Vec<usize> = values.iter().map(Vec::len).collect();
        let capacity = capacity_of(&domain_sizes)?;

        Ok(Self {
            categories,
            values,
            domain_sizes,
            capacity,
        })
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn domain_sizes(&self) -> &[usize] {
        &self.domain_sizes
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Tuple length.
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capacity == 0
    }

    /// Map an index tuple to its category/value pairs.
    ///
    /// # Panics
    ///
    /// If the tuple has the wrong length or a component is outside its
    /// category's domain. Only a broken sampler can produce such a tuple.
    pub fn decode(&self, index: &CombinationIndex) -> Combination {
        assert_eq!(
            index.0.len(),
            self.category_count(),
            "combination index has {} components, space has {} categories",
            index.0.len(),
            self.category_count()
        );
        self.categories
            .iter()
            .zip(&self.values)
            .zip(&index.0)
            .map(|((category, candidates), &i)| {
                assert!(
                    i < candidates.len(),
                    "index {i} out of domain for category {category:?} (size {})",
                    candidates.len()
                );
                (category.clone(), candidates[i].clone())
            })
            .collect()
    }

    /// Mixed-radix decomposition of `rank` in `[0, capacity)`.
    ///
    /// The last category varies fastest.
    pub fn unrank(&self, rank: u64) -> CombinationIndex {
        assert!(
            rank < self.capacity,
            "rank {rank} out of range for capacity {}",
            self.capacity
        );
        let mut rest = rank;
        let mut components = vec![0usize; self.category_count()];
        for (slot, &size) in components.iter_mut().zip(&self.domain_sizes).rev() {
            let size = size as u64;
            *slot = (rest % size) as usize;
            rest /= size;
        }
        CombinationIndex(components)
    }

    /// Inverse of [`unrank`](Self::unrank). Injective over the space, since
    /// the capacity fits in a `u64`.
    pub fn rank(&self, index: &CombinationIndex) -> u64 {
        debug_assert_eq!(index.0.len(), self.category_count());
        index
            .0
            .iter()
            .zip(&self.domain_sizes)
            .fold(0u64, |acc, (&i, &size)| acc * size as u64 + i as u64)
    }

    /// A uniformly random tuple; each component independent.
    pub fn random_index<R: Rng + ?Sized>(&self, rng: &mut R) -> CombinationIndex {
        debug_assert!(!self.is_empty(), "cannot draw from an empty space");
        CombinationIndex(
            self.domain_sizes
                .iter()
                .map(|&size| rng.gen_range(0..size))
                .collect(),
        )
    }
}

/// Product of domain sizes. Any empty domain gives 0 before multiplying, so
/// only spaces that are truly too large overflow.
fn capacity_of(domain_sizes: &[usize]) -> Result<u64, SpaceError> {
    if domain_sizes.contains(&0) {
        return Ok(0);
    }
    domain_sizes.iter().try_fold(1u64, |acc, &size| {
        acc.checked_mul(size as u64)
            .ok_or(SpaceError::CapacityOverflow)
    })
}
