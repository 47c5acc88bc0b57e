//! Buckets of position entries and their in-place sort.

use std::cmp::Ordering;

use crate::core::{Orderable, PositionEntry};

/// Buckets up to this size are sorted by insertion over [`Bucket::less`] and
/// [`Bucket::swap`]. Larger ones use pdqsort on the same ordering.
const INSERTION_SORT_THRESHOLD: usize = 16;

/// A contiguous run of position entries sharing one truncated digest.
///
/// The bucket borrows its entries mutably, so exactly one owner can sort it. After
/// sorting, ownership moves to the collector, which only reads it.
pub(crate) struct Bucket<'a, C: Orderable + ?Sized> {
    collection: &'a C,
    ordinal: usize,
    entries: &'a mut [PositionEntry<C::Digest>],
    sorted: bool,
}

impl<'a, C: Orderable + ?Sized> Bucket<'a, C> {
    pub fn new(
        collection: &'a C,
        ordinal: usize,
        entries: &'a mut [PositionEntry<C::Digest>],
    ) -> Self {
        Self { collection, ordinal, entries, sorted: false }
    }

    /// Rank of this bucket among the non-empty buckets, in ascending digest order.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Digest first, full comparator on digest ties.
    pub fn less(&self, i: usize, j: usize) -> bool {
        compare_entries(self.collection, &self.entries[i], &self.entries[j]) == Ordering::Less
    }

    pub fn swap(&mut self, i: usize, j: usize) {
        self.entries.swap(i, j);
    }

    /// Sorts the entries by digest, breaking ties with the collection's comparator.
    pub fn sort(&mut self) {
        if self.len() <= INSERTION_SORT_THRESHOLD {
            self.insertion_sort();
        } else {
            let collection = self.collection;
            self.entries.sort_unstable_by(|a, b| compare_entries(collection, a, b));
        }
        self.sorted = true;
    }

    fn insertion_sort(&mut self) {
        for i in 1..self.len() {
            let mut j = i;
            while j > 0 && self.less(j, j - 1) {
                self.swap(j, j - 1);
                j -= 1;
            }
        }
    }

    /// Sorts the entries with the collection's comparator alone.
    ///
    /// Used for small inputs, where the whole input is a single bucket.
    pub fn sort_by_comparator(&mut self) {
        let collection = self.collection;
        self.entries
            .sort_unstable_by(|a, b| compare_positions(collection, a.index, b.index));
        self.sorted = true;
    }

    /// Original positions in the bucket's current order.
    pub fn positions(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        self.entries.iter().map(|entry| entry.index)
    }
}

/// Compares two entries.
///
/// 1. **Fast path**: Compares cached digests.
/// 2. **Slow path**: Equal digests say nothing about order, so defer to the collection.
#[inline(always)]
fn compare_entries<C: Orderable + ?Sized>(
    collection: &C,
    a: &PositionEntry<C::Digest>,
    b: &PositionEntry<C::Digest>,
) -> Ordering {
    if a.digest != b.digest {
        return a.digest.cmp(&b.digest);
    }
    compare_positions(collection, a.index, b.index)
}

#[inline(always)]
fn compare_positions<C: Orderable + ?Sized>(collection: &C, i: usize, j: usize) -> Ordering {
    if collection.less(i, j) {
        Ordering::Less
    } else if collection.less(j, i) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Entries for every position of a byte-like collection.
    fn entries_for(data: &Vec<&str>) -> Vec<PositionEntry<u64>> {
        (0..data.len())
            .map(|index| PositionEntry { index, digest: data.digest(index) })
            .collect()
    }

    #[test]
    fn test_sort_resolves_digest_ties() {
        // Identical 8-byte prefixes collide on the digest.
        let data = vec!["prefix00c", "prefix00a", "prefix00b", "a"];
        let mut entries = entries_for(&data);
        let mut bucket = Bucket::new(&data, 0, &mut entries);
        assert!(!bucket.is_sorted());

        bucket.sort();

        assert!(bucket.is_sorted());
        assert_eq!(bucket.positions().collect::<Vec<_>>(), vec![3, 1, 2, 0]);
    }

    #[test]
    fn test_sort_by_comparator_matches_std() {
        let data = vec!["banana", "apple", "cherry"];
        let mut entries = entries_for(&data);
        let mut bucket = Bucket::new(&data, 0, &mut entries);

        bucket.sort_by_comparator();

        assert_eq!(bucket.positions().collect::<Vec<_>>(), vec![1, 0, 2]);
    }

    #[test]
    fn test_less_compares_digest_then_comparator() {
        let data = vec!["prefix00b", "prefix00a", "b", "a"];
        let mut entries = entries_for(&data);
        let mut bucket = Bucket::new(&data, 7, &mut entries);
        assert_eq!(bucket.ordinal(), 7);

        assert!(bucket.less(1, 0));
        assert!(!bucket.less(0, 1));
        assert!(bucket.less(3, 2));
        assert!(bucket.less(2, 0));

        bucket.swap(0, 3);
        assert_eq!(bucket.positions().collect::<Vec<_>>(), vec![3, 1, 2, 0]);
    }

    #[rstest]
    #[case::insertion(INSERTION_SORT_THRESHOLD)]
    #[case::pdqsort(INSERTION_SORT_THRESHOLD + 1)]
    #[case::large(500)]
    fn test_sort_paths_agree_on_ties(#[case] len: usize) {
        // Half the keys collide on the digest and differ only past byte 8.
        let data: Vec<String> = (0..len)
            .map(|i| if i % 2 == 0 { format!("collide-{:04}", len - i) } else { format!("{i:04}") })
            .collect();
        let mut entries: Vec<PositionEntry<u64>> = (0..data.len())
            .map(|index| PositionEntry { index, digest: data.digest(index) })
            .collect();
        let mut bucket = Bucket::new(&data, 0, &mut entries);

        bucket.sort();

        let mut expected: Vec<usize> = (0..len).collect();
        expected.sort_by(|&a, &b| data[a].cmp(&data[b]));
        assert_eq!(bucket.positions().collect::<Vec<_>>(), expected);
    }
}
