//! Sort entry points and the background pipeline.
//!
//! A sort call runs in three roles:
//! - **Orchestration**: partitions the input into buckets, then collects sorted
//!   buckets in order (the background `bigsort-pipeline` thread for [`bigsort`], the
//!   calling thread for [`bigsort_indices`]).
//! - **Workers**: a per-call rayon pool sorting groups of buckets.
//! - **Consumer**: whoever pulls positions from [`SortedIndices`].
//!
//! The main entry points are [`bigsort`] and [`bigsort_indices`].

use std::iter::FusedIterator;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, bounded};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::collector::{ChunkedSender, OrderedCollector, PositionSink};
use crate::config::SortConfig;
use crate::core::{Orderable, RadixDigest};
use crate::dispatch::sort_buckets;
use crate::error::Result;
use crate::partition::{BucketTable, Strategy};

/// Sorts a shared collection in the background, returning its positions lazily.
///
/// Returns immediately. Positions arrive in ascending order as soon as each leading
/// run of buckets is sorted, without waiting for the whole input.
///
/// # Panics
///
/// Panics if the worker pool or the pipeline thread cannot be started.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use bigsort::bigsort;
///
/// let data = Arc::new(vec!["banana", "apple", "cherry"]);
/// let indices: Vec<usize> = bigsort(data).collect();
///
/// assert_eq!(indices, vec![1, 0, 2]); // apple, banana, cherry
/// ```
pub fn bigsort<C>(collection: Arc<C>) -> SortedIndices
where
    C: Orderable + Send + Sync + ?Sized + 'static,
{
    bigsort_with(collection, SortConfig::default())
        .unwrap_or_else(|e| panic!("Failed to start sort: {e}"))
}

/// Sorts a shared collection in the background with an explicit configuration.
///
/// # Errors
///
/// Returns an error if `config` is invalid or the pipeline thread cannot be started.
///
/// # Panics
///
/// The worker pool is started on the pipeline thread once the bucket table is known.
/// If that fails, iterating the returned [`SortedIndices`] panics with the cause.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use bigsort::{bigsort_with, SortConfig};
///
/// let data: Arc<Vec<String>> = Arc::new((0..50_000).rev().map(|i| format!("{i:08}")).collect());
/// let config = SortConfig::default().with_threads(2);
/// let indices = bigsort_with(data.clone(), config).unwrap();
///
/// assert_eq!(indices.len(), 50_000);
/// assert!(indices.map(|i| &data[i]).is_sorted());
/// ```
pub fn bigsort_with<C>(collection: Arc<C>, config: SortConfig) -> Result<SortedIndices>
where
    C: Orderable + Send + Sync + ?Sized + 'static,
{
    config.validate()?;
    let len = collection.len();
    let strategy = config.strategy_for(len, <C::Digest as RadixDigest>::BITS);
    if strategy == Strategy::Empty {
        return Ok(SortedIndices::empty());
    }

    // Every chunk but the last carries at least `output_chunk_len` positions.
    let (tx, rx) = bounded(len / config.output_chunk_len + 1);
    let pipeline = thread::Builder::new()
        .name("bigsort-pipeline".to_string())
        .spawn(move || {
            let mut sink = ChunkedSender::new(tx, config.output_chunk_len);
            match run(&*collection, strategy, &config, &mut sink) {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => {
                    log::debug!("Sort of {len} items abandoned by its consumer");
                }
                Err(e) => panic!("Sort of {len} items failed: {e}"),
            }
        })?;

    Ok(SortedIndices {
        receiver: Some(rx),
        current: Vec::new().into_iter(),
        remaining: len,
        pipeline: Some(pipeline),
    })
}

/// Sorts a borrowed collection on the calling thread, returning the sorted positions.
///
/// Buckets are still sorted on a worker pool when the input is large enough.
///
/// # Panics
///
/// Panics if the worker pool cannot be started.
///
/// # Examples
///
/// ```
/// use bigsort::bigsort_indices;
///
/// let data = vec!["banana", "apple", "cherry"];
/// assert_eq!(bigsort_indices(&data), vec![1, 0, 2]);
/// ```
pub fn bigsort_indices<C>(collection: &C) -> Vec<usize>
where
    C: Orderable + Sync + ?Sized,
{
    bigsort_indices_with(collection, &SortConfig::default())
        .unwrap_or_else(|e| panic!("Failed to start sort: {e}"))
}

/// Sorts a borrowed collection on the calling thread with an explicit configuration.
///
/// # Errors
///
/// Returns an error if `config` is invalid or the worker pool cannot be started.
pub fn bigsort_indices_with<C>(collection: &C, config: &SortConfig) -> Result<Vec<usize>>
where
    C: Orderable + Sync + ?Sized,
{
    config.validate()?;
    let len = collection.len();
    let strategy = config.strategy_for(len, <C::Digest as RadixDigest>::BITS);

    let mut indices = Vec::with_capacity(len);
    let flow = run(collection, strategy, config, &mut indices)?;
    debug_assert!(flow.is_continue());
    Ok(indices)
}

/// Sorts a mutable slice in-place.
///
/// This is a convenience wrapper for [`bigsort_indices`] which computes the sorted
/// positions and then applies the permutation to the slice.
///
/// # Examples
///
/// ```
/// use bigsort::bigsort_mut;
///
/// let mut data = vec!["banana", "apple", "cherry"];
/// bigsort_mut(&mut data);
///
/// assert_eq!(data, vec!["apple", "banana", "cherry"]);
/// ```
pub fn bigsort_mut<T: AsRef<[u8]> + Sync>(data: &mut [T]) {
    let indices = bigsort_indices(&*data);
    apply_permutation(data, indices);
}

/// Sorts owned strings in the background.
///
/// ```
/// use bigsort::bigsort_strings;
///
/// let words = vec!["pear".to_string(), "fig".to_string()];
/// assert_eq!(bigsort_strings(words).collect::<Vec<_>>(), vec![1, 0]);
/// ```
pub fn bigsort_strings(items: Vec<String>) -> SortedIndices {
    bigsort(Arc::new(items))
}

fn apply_permutation<T>(data: &mut [T], mut indices: Vec<usize>) {
    for i in 0..data.len() {
        let mut current = i;
        while indices[current] != i {
            let next = indices[current];
            data.swap(current, next);
            indices[current] = current; // Mark as visited/placed
            current = next;
        }
        indices[current] = current;
    }
}

/// Starts a worker pool only if the table spans more than one group.
fn build_pool(num_buckets: usize, config: &SortConfig) -> Result<Option<ThreadPool>> {
    if num_buckets <= config.bucket_group_size {
        return Ok(None);
    }
    let pool = ThreadPoolBuilder::new()
        .num_threads(config.threads.unwrap_or(0))
        .thread_name(|i| format!("bigsort-worker-{i}"))
        .build()?;
    config.trace(format_args!("Started {} worker threads", pool.current_num_threads()));
    Ok(Some(pool))
}

/// Runs one sort to completion, feeding positions to `sink` in ascending order.
///
/// The worker pool, if any, lives only as long as this call.
fn run<C, S>(
    collection: &C,
    strategy: Strategy,
    config: &SortConfig,
    sink: &mut S,
) -> Result<ControlFlow<()>>
where
    C: Orderable + Sync + ?Sized,
    S: PositionSink,
{
    let len = collection.len();
    config.trace(format_args!("Num objects: {len}, strategy: {strategy:?}"));

    match strategy {
        Strategy::Empty => Ok(sink.finish()),
        Strategy::Direct => Ok(sort_direct(collection, sink)),
        Strategy::Bucketed { bits } => {
            let mut table = BucketTable::partition(collection, bits);
            config.trace(format_args!("Num buckets: {}", table.num_buckets()));
            let pool = build_pool(table.num_buckets(), config)?;
            let buckets = table.buckets(collection);
            let mut collector = OrderedCollector::new(buckets.len(), len);
            if sort_buckets(buckets, &mut collector, sink, pool.as_ref(), config).is_break() {
                return Ok(ControlFlow::Break(()));
            }
            Ok(collector.finish(sink))
        }
    }
}

fn sort_direct<C, S>(collection: &C, sink: &mut S) -> ControlFlow<()>
where
    C: Orderable + ?Sized,
    S: PositionSink,
{
    let mut table = BucketTable::single(collection);
    let mut buckets = table.buckets(collection);
    let mut collector = OrderedCollector::new(buckets.len(), collection.len());
    if let Some(mut bucket) = buckets.pop() {
        bucket.sort_by_comparator();
        collector.accept(bucket, sink)?;
    }
    collector.finish(sink)
}

/// Lazily produced sorted positions of a [`bigsort`] call.
///
/// Yields every position `0..len` exactly once, in ascending item order. It can be
/// consumed once and is not restartable. Dropping it early cancels the remaining
/// work in the background.
///
/// # Panics
///
/// Iteration re-raises any panic from the background pipeline, such as one from the
/// collection's comparator.
#[derive(Debug)]
pub struct SortedIndices {
    receiver: Option<Receiver<Vec<usize>>>,
    current: std::vec::IntoIter<usize>,
    remaining: usize,
    pipeline: Option<JoinHandle<()>>,
}

impl SortedIndices {
    /// A sequence with no positions, as produced for an empty collection.
    #[must_use]
    pub fn empty() -> Self {
        Self { receiver: None, current: Vec::new().into_iter(), remaining: 0, pipeline: None }
    }

    /// Blocks for the next chunk. Returns `false` once the pipeline is done.
    fn pull_chunk(&mut self) -> bool {
        let Some(receiver) = &self.receiver else {
            return false;
        };
        if let Ok(chunk) = receiver.recv() {
            self.current = chunk.into_iter();
            return true;
        }
        self.receiver = None;
        self.join_pipeline();
        false
    }

    fn join_pipeline(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            if let Err(panic) = pipeline.join() {
                std::panic::resume_unwind(panic);
            }
        }
        assert_eq!(
            self.remaining, 0,
            "sort pipeline stopped with {} positions outstanding",
            self.remaining
        );
    }
}

impl Default for SortedIndices {
    fn default() -> Self {
        Self::empty()
    }
}

impl Iterator for SortedIndices {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if let Some(index) = self.current.next() {
                self.remaining -= 1;
                return Some(index);
            }
            if !self.pull_chunk() {
                return None;
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SortedIndices {}

impl FusedIterator for SortedIndices {}
