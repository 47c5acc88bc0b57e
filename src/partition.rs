//! Strategy selection and radix partitioning into buckets.
//!
//! Partitioning is a single counting pass over the top bits of every digest:
//!
//! 1. Counts entries per bucket key (histogram).
//! 2. Computes prefix sums to find where each bucket starts, dropping empty buckets.
//! 3. Permutes entries through an auxiliary buffer into one contiguous table.
//!
//! Bucket keys are the truncated digests themselves, so ascending key order is
//! ascending item order and no separate sort of bucket identities is needed.

use std::collections::BTreeMap;

use crate::bucket::Bucket;
use crate::config::SortConfig;
use crate::core::{Orderable, PositionEntry, RadixDigest};

/// Dense histograms are always allowed up to this many slots.
const DENSE_TABLE_FLOOR: usize = 1 << 16;

/// How a sort call processes its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Nothing to sort.
    Empty,
    /// Sort all positions at once with the full comparator.
    Direct,
    /// Partition by the top `bits` digest bits and sort buckets in parallel.
    Bucketed {
        /// Digest bits that form the bucket key.
        bits: u32,
    },
}

pub(crate) fn choose_strategy(len: usize, config: &SortConfig, digest_bits: u32) -> Strategy {
    match len {
        0 => Strategy::Empty,
        1 => Strategy::Direct,
        len if len < config.small_input_threshold => Strategy::Direct,
        len => {
            let bits = if len >= config.big_input_threshold {
                config.big_bucket_bits
            } else {
                config.medium_bucket_bits
            };
            Strategy::Bucketed { bits: bits.min(digest_bits) }
        }
    }
}

fn key_space(bits: u32) -> usize {
    1usize.checked_shl(bits).unwrap_or(usize::MAX)
}

/// Per-key counts, dense when the key space is small next to the input.
enum Histogram {
    Dense(Vec<usize>),
    Sparse(BTreeMap<usize, usize>),
}

impl Histogram {
    fn new(bits: u32, len: usize) -> Self {
        let slots = key_space(bits);
        if slots <= len.max(DENSE_TABLE_FLOOR) {
            Histogram::Dense(vec![0; slots])
        } else {
            Histogram::Sparse(BTreeMap::new())
        }
    }

    #[inline(always)]
    fn slot(&mut self, key: usize) -> &mut usize {
        match self {
            Histogram::Dense(counts) => &mut counts[key],
            Histogram::Sparse(counts) => counts.entry(key).or_insert(0),
        }
    }

    /// Replaces every count with its bucket's start offset and returns the lengths
    /// of the non-empty buckets in ascending key order.
    fn prefix_sums(&mut self) -> Vec<usize> {
        let mut lengths = Vec::new();
        let mut sum = 0;
        let mut visit = |slot: &mut usize| {
            let count = *slot;
            *slot = sum;
            sum += count;
            if count > 0 {
                lengths.push(count);
            }
        };
        match self {
            Histogram::Dense(counts) => counts.iter_mut().for_each(&mut visit),
            Histogram::Sparse(counts) => counts.values_mut().for_each(&mut visit),
        }
        lengths
    }
}

/// Position entries laid out bucket after bucket, in ascending bucket order.
pub(crate) struct BucketTable<D> {
    entries: Vec<PositionEntry<D>>,
    lengths: Vec<usize>,
}

impl<D: RadixDigest> BucketTable<D> {
    /// One bucket holding every position.
    pub fn single<C: Orderable<Digest = D> + ?Sized>(collection: &C) -> Self {
        let entries = collect_entries(collection);
        let lengths = if entries.is_empty() { Vec::new() } else { vec![entries.len()] };
        Self { entries, lengths }
    }

    /// Partitions every position by the top `bits` bits of its digest.
    pub fn partition<C: Orderable<Digest = D> + ?Sized>(collection: &C, bits: u32) -> Self {
        let mut entries = collect_entries(collection);
        let mut histogram = Histogram::new(bits, entries.len());

        // 1. Count frequencies
        entries.iter().for_each(|entry| {
            *histogram.slot(entry.digest.top_bits(bits)) += 1;
        });

        // 2. Compute offsets, compacting out empty buckets
        let lengths = histogram.prefix_sums();

        // 3. Permute using aux buffer
        let buffer = entries.clone();
        buffer.iter().for_each(|entry| {
            let pos = histogram.slot(entry.digest.top_bits(bits));
            entries[*pos] = *entry;
            *pos += 1;
        });

        Self { entries, lengths }
    }

    /// Number of non-empty buckets.
    pub fn num_buckets(&self) -> usize {
        self.lengths.len()
    }

    /// Splits the table into disjoint buckets, ordinal `i` at index `i`.
    pub fn buckets<'a, C>(&'a mut self, collection: &'a C) -> Vec<Bucket<'a, C>>
    where
        C: Orderable<Digest = D> + ?Sized,
    {
        let mut rest = self.entries.as_mut_slice();
        self.lengths
            .iter()
            .enumerate()
            .map(|(ordinal, &len)| {
                let (head, tail) = std::mem::take(&mut rest).split_at_mut(len);
                rest = tail;
                Bucket::new(collection, ordinal, head)
            })
            .collect()
    }
}

fn collect_entries<C: Orderable + ?Sized>(collection: &C) -> Vec<PositionEntry<C::Digest>> {
    (0..collection.len())
        .map(|index| PositionEntry { index, digest: collection.digest(index) })
        .collect()
}
