// SPDX-License-Identifier: GPL-3.0-only

//! Linear delta between two sorted snapshots.

use std::cmp::Ordering;

/// Items only present in the new list, and items only present in the old one.
///
/// Both lists come out in reverse scan order. Callers must not rely on them
/// being sorted.
#[derive(Debug, PartialEq, Eq)]
pub struct SortedDiff<'a, T> {
    pub added: Vec<&'a T>,
    pub removed: Vec<&'a T>,
}

impl<T> SortedDiff<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Merge-walk `old` and `new`, both already sorted under `cmp`.
///
/// Equality under `cmp` is the only notion of "unchanged": two items with the
/// same identity but different contents are reported in neither list.
pub fn diff_sorted<'a, T, F>(old: &'a [T], new: &'a [T], mut cmp: F) -> SortedDiff<'a, T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut added = Vec::new();
    let mut removed = Vec::new();

    let mut i = 0;
    let mut j = 0;
    while i < old.len() && j < new.len() {
        match cmp(&old[i], &new[j]) {
            Ordering::Less => {
                removed.push(&old[i]);
                i += 1;
            }
            Ordering::Greater => {
                added.push(&new[j]);
                j += 1;
            }
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    removed.extend(&old[i..]);
    added.extend(&new[j..]);

    added.reverse();
    removed.reverse();

    SortedDiff { added, removed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<u32>) -> Vec<u32> {
        v.sort_unstable();
        v.dedup();
        v
    }

    #[test]
    fn reports_nothing_for_identical_lists() {
        let a = vec![1, 3, 5];
        let delta = diff_sorted(&a, &a, u32::cmp);
        assert!(delta.is_empty());
    }

    #[test]
    fn interleaved_changes_come_out_in_reverse_scan_order() {
        let old = vec![1, 2, 4, 7, 9];
        let new = vec![2, 3, 4, 8, 10, 11];

        let delta = diff_sorted(&old, &new, u32::cmp);

        assert_eq!(delta.added, vec![&11, &10, &8, &3]);
        assert_eq!(delta.removed, vec![&9, &7, &1]);
    }

    #[test]
    fn empty_sides() {
        let none: Vec<u32> = Vec::new();
        let some = vec![1, 2];

        let delta = diff_sorted(&none, &some, u32::cmp);
        assert_eq!(delta.added, vec![&2, &1]);
        assert!(delta.removed.is_empty());

        let delta = diff_sorted(&some, &none, u32::cmp);
        assert!(delta.added.is_empty());
        assert_eq!(delta.removed, vec![&2, &1]);
    }

    #[test]
    fn equal_identity_with_different_payload_is_unchanged() {
        let old = vec![("sda", 1), ("sdb", 1)];
        let new = vec![("sda", 2), ("sdb", 1)];

        let delta = diff_sorted(&old, &new, |a, b| a.0.cmp(b.0));

        assert!(delta.is_empty());
    }

    // Deterministic sweep over many list pairs: the delta must partition
    // both inputs into (only-old, common) and (only-new, common).
    #[test]
    fn partitions_inputs_for_generated_lists() {
        let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        for _ in 0..500 {
            let old = sorted((0..next() % 20).map(|_| (next() % 30) as u32).collect());
            let new = sorted((0..next() % 20).map(|_| (next() % 30) as u32).collect());

            let delta = diff_sorted(&old, &new, u32::cmp);

            let common = old.iter().filter(|x| new.contains(x)).count();
            assert_eq!(delta.added.len() + common, new.len());
            assert_eq!(delta.removed.len() + common, old.len());
            assert!(delta.added.iter().all(|x| !old.contains(x) && new.contains(x)));
            assert!(delta.removed.iter().all(|x| old.contains(x) && !new.contains(x)));
        }
    }
}
