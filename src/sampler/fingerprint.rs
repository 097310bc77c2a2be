use ahash::AHashSet;

use crate::sampler::space::{CombinationIndex, SpaceModel};

/// Compact identity of a combination index within one space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u64);

pub type FingerprintSet = AHashSet<Fingerprint>;

/// The tuple's mixed-radix rank in `space`.
///
/// Exact: distinct tuples of the same space never share a fingerprint, so a
/// rejection loop always finds the unseen tuples `remaining` counts.
pub fn fingerprint(space: &SpaceModel, index: &CombinationIndex) -> Fingerprint {
    Fingerprint(space.rank(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::CategoryDictionary;

    fn space(sizes: &[usize]) -> SpaceModel {
        let dict: CategoryDictionary = sizes
            .iter()
            .enumerate()
            .map(|(i, &n)| (format!("C{i}"), (0..n).map(|v| format!("v{v}")).collect()))
            .collect();
        SpaceModel::new(&dict).unwrap()
    }

    #[test]
    fn test_equal_tuples_share_a_fingerprint() {
        let space = space(&[5, 5, 5]);
        let a = CombinationIndex(vec![3, 1, 4]);
        let b = CombinationIndex(vec![3, 1, 4]);
        assert_eq!(fingerprint(&space, &a), fingerprint(&space, &b));
    }

    #[test]
    fn test_component_order_matters() {
        let space = space(&[3, 3]);
        let a = CombinationIndex(vec![1, 2]);
        let b = CombinationIndex(vec![2, 1]);
        assert_ne!(fingerprint(&space, &a), fingerprint(&space, &b));
    }

    #[test]
    fn test_every_tuple_has_its_own_fingerprint() {
        let space = space(&[40, 40, 40]);
        let mut set = FingerprintSet::new();
        for a in 0..40 {
            for b in 0..40 {
                for c in 0..40 {
                    assert!(set.insert(fingerprint(&space, &CombinationIndex(vec![a, b, c]))));
                }
            }
        }
        assert_eq!(set.len() as u64, space.capacity());
    }

    #[test]
    fn test_wide_space_stays_exact() {
        // 2^48 combinations.
        let n = 1 << 16;
        let space = space(&[n, n, n]);
        let last = CombinationIndex(vec![n - 1, n - 1, n - 1]);
        let prev = CombinationIndex(vec![n - 1, n - 1, n - 2]);
        assert_eq!(fingerprint(&space, &last), Fingerprint(space.capacity() - 1));
        assert_ne!(fingerprint(&space, &last), fingerprint(&space, &prev));
    }
}
