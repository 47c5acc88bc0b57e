//! # Bigsort
//!
//! `bigsort` is a concurrent, order-preserving sort engine for very large collections
//! of comparable items, such as tens of millions of strings. It never moves the items
//! themselves: it returns the permutation of original positions that puts them in
//! ascending order.
//!
//! ## How it works
//!
//! - **Digests**: every item exposes a fixed-width unsigned digest whose order is a
//!   prefix of the item order (for strings, their first 8 bytes). Only
//!   `(digest, position)` pairs are moved while sorting.
//! - **Radix bucketing**: large inputs are partitioned by the top bits of each
//!   digest into buckets whose index order is already the item order.
//! - **Parallel bucket sort**: groups of buckets are sorted on a worker pool,
//!   comparing digests first and falling back to the full comparator on ties.
//! - **Ordered collection**: sorted buckets are released strictly in bucket order as
//!   soon as each leading run is complete, so the first positions are available long
//!   before the last bucket finishes.
//!
//! Small inputs skip bucketing and are sorted directly with the comparator.
//!
//! ## Usage
//!
//! ### Basic Usage
//!
//! For byte-like collections (`Vec<String>`, `Vec<Vec<u8>>`, `VecDeque<&str>`, ...) use
//! [`bigsort`] for a lazy background sort, [`bigsort_indices`] for a blocking one, or
//! [`bigsort_mut`] to reorder a slice in place.
//!
//! ```rust
//! use std::sync::Arc;
//! use bigsort::bigsort;
//!
//! let data = Arc::new(vec!["banana", "apple", "cherry", "date"]);
//! let sorted: Vec<&str> = bigsort(data.clone()).map(|i| data[i]).collect();
//!
//! assert_eq!(sorted, vec!["apple", "banana", "cherry", "date"]);
//! ```
//!
//! ### Custom Types
//!
//! Implement [`Orderable`] to sort anything addressable by position.
//!
//! ```rust
//! use bigsort::{bigsort_indices, Orderable};
//!
//! struct Readings(Vec<(u32, String)>);
//!
//! impl Orderable for Readings {
//!     type Digest = u32;
//!
//!     fn len(&self) -> usize {
//!         self.0.len()
//!     }
//!
//!     fn less(&self, i: usize, j: usize) -> bool {
//!         self.0[i] < self.0[j]
//!     }
//!
//!     // The first tuple field decides the order whenever it differs.
//!     fn digest(&self, index: usize) -> u32 {
//!         self.0[index].0
//!     }
//! }
//!
//! let readings = Readings(vec![(7, "b".into()), (3, "z".into()), (7, "a".into())]);
//! assert_eq!(bigsort_indices(&readings), vec![1, 2, 0]);
//! ```
//!
//! ## Correctness contract
//!
//! The comparator must be a strict weak ordering and the digest must be
//! order-compatible with it. Neither is checked; violating them yields an incorrect
//! permutation rather than an error.

pub mod algo;
mod bucket;
mod collector;
pub mod config;
pub mod core;
mod dispatch;
pub mod error;
pub mod partition;

pub use crate::algo::{
    SortedIndices, bigsort, bigsort_indices, bigsort_indices_with, bigsort_mut, bigsort_strings,
    bigsort_with,
};
pub use crate::config::{LogTrace, NoopTrace, SortConfig, TraceSink};
pub use crate::core::{Orderable, RadixDigest};
pub use crate::error::{BigSortError, Result};
pub use crate::partition::Strategy;

pub mod prelude {
    pub use crate::algo::{SortedIndices, bigsort, bigsort_indices, bigsort_mut, bigsort_with};
    pub use crate::config::SortConfig;
    pub use crate::core::Orderable;
}
