//! Core traits and types for bigsort.
//!
//! This module defines:
//! - [`Orderable`]: The trait users implement to sort their collections.
//! - [`RadixDigest`]: Fixed-width unsigned digests used for bucketing.
//! - PositionEntry: Internal (digest, original index) pair moved in place of items.

use std::collections::VecDeque;
use std::fmt;

/// Number of key bytes folded into the digest of byte-like items.
pub const PREFIX_DIGEST_SIZE: usize = 8;

/// A fixed-width unsigned integer whose ordering is a prefix of the item order.
///
/// Implemented for `u8`, `u16`, `u32` and `u64`.
pub trait RadixDigest: Copy + Ord + Send + Sync + fmt::Debug + 'static {
    /// Width of the digest in bits.
    const BITS: u32;

    /// Returns the top `bits` bits of the digest as a bucket ordinal.
    ///
    /// `bits` must not exceed [`Self::BITS`]; `top_bits(0)` is always 0.
    fn top_bits(self, bits: u32) -> usize;
}

macro_rules! impl_radix_digest {
    ($($ty:ty),*) => {
        $(
            impl RadixDigest for $ty {
                const BITS: u32 = <$ty>::BITS;

                #[inline(always)]
                fn top_bits(self, bits: u32) -> usize {
                    debug_assert!(bits <= Self::BITS);
                    if bits == 0 {
                        return 0;
                    }
                    (self >> (Self::BITS - bits)) as usize
                }
            }
        )*
    };
}

impl_radix_digest!(u8, u16, u32, u64);

/// An index and its cached digest. Only this pair is moved while sorting, never the item.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PositionEntry<D> {
    pub index: usize,
    pub digest: D,
}

/// A collection that can be sorted by position.
///
/// Implementors provide a strict weak ordering over positions `0..len()` and a digest
/// per position that is *order-compatible*: if `digest(i) < digest(j)` then item `i`
/// must sort before item `j`. Equal digests fall back to [`Orderable::less`].
///
/// Neither property is validated. A comparator that is not a total order, or a digest
/// that disagrees with it, silently produces an incorrect permutation.
///
/// # Examples
///
/// ```
/// use bigsort::core::Orderable;
///
/// struct Scores(Vec<u32>);
///
/// impl Orderable for Scores {
///     type Digest = u32;
///
///     fn len(&self) -> usize {
///         self.0.len()
///     }
///
///     fn less(&self, i: usize, j: usize) -> bool {
///         self.0[i] < self.0[j]
///     }
///
///     fn digest(&self, index: usize) -> u32 {
///         self.0[index]
///     }
/// }
/// ```
pub trait Orderable {
    /// The digest type, usually `u32` or `u64`.
    type Digest: RadixDigest;

    /// Returns the number of items in the collection.
    fn len(&self) -> usize;

    /// Returns `true` if the collection is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the item at `i` sorts strictly before the item at `j`.
    fn less(&self, i: usize, j: usize) -> bool;

    /// Returns the order-compatible digest of the item at `index`.
    fn digest(&self, index: usize) -> Self::Digest;
}

/// Digest of a byte key: its first 8 bytes read big-endian, zero padded.
///
/// Zero padding keeps the digest order-compatible with byte-lexicographic order:
/// a shorter key never gets a larger digest than a key it is a prefix of.
///
/// ```
/// use bigsort::core::prefix_digest;
///
/// assert_eq!(prefix_digest(b""), 0);
/// assert_eq!(prefix_digest(b"a"), 0x6100_0000_0000_0000);
/// assert!(prefix_digest(b"apple") < prefix_digest(b"banana"));
/// ```
#[inline(always)]
pub fn prefix_digest(key: &[u8]) -> u64 {
    if let Some(head) = key.first_chunk::<PREFIX_DIGEST_SIZE>() {
        return u64::from_be_bytes(*head);
    }
    let mut buf = [0u8; PREFIX_DIGEST_SIZE];
    buf[..key.len()].copy_from_slice(key);
    u64::from_be_bytes(buf)
}

// Blanket implementation for indexable slices of byte-ref types.
impl<T: AsRef<[u8]>> Orderable for [T] {
    type Digest = u64;

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn less(&self, i: usize, j: usize) -> bool {
        self[i].as_ref() < self[j].as_ref()
    }

    fn digest(&self, index: usize) -> u64 {
        prefix_digest(self[index].as_ref())
    }
}

// Explicit Vec impl to improve ergonomics (avoiding .as_slice()).
impl<T: AsRef<[u8]>> Orderable for Vec<T> {
    type Digest = u64;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn less(&self, i: usize, j: usize) -> bool {
        self[i].as_ref() < self[j].as_ref()
    }

    fn digest(&self, index: usize) -> u64 {
        prefix_digest(self[index].as_ref())
    }
}

// VecDeque has O(1) random access, so it can be sorted by position too.
impl<T: AsRef<[u8]>> Orderable for VecDeque<T> {
    type Digest = u64;

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn less(&self, i: usize, j: usize) -> bool {
        self[i].as_ref() < self[j].as_ref()
    }

    fn digest(&self, index: usize) -> u64 {
        prefix_digest(self[index].as_ref())
    }
}
