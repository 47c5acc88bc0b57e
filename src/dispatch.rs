//! Bucket sorting across a worker pool.
//!
//! The bucket table is cut into contiguous groups of `bucket_group_size` buckets and
//! each group becomes one pool task. A task owns its buckets outright, sorts them one
//! by one, and hands each sorted bucket back to the collector over a bounded queue.
//! Tables that fit in a single group are sorted serially on the calling thread.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossbeam_channel::bounded;
use cuneiform::cuneiform;
use rayon::ThreadPool;

use crate::bucket::Bucket;
use crate::collector::{OrderedCollector, PositionSink};
use crate::config::SortConfig;
use crate::core::Orderable;

// Cache-aligned: every worker touches it after each bucket.
#[cuneiform]
struct DispatchState {
    cancelled: AtomicBool,
    sorted: AtomicUsize,
}

/// Sorts every bucket and reports it to `collector` as it completes.
///
/// Returns [`ControlFlow::Break`] if the sink stopped accepting positions.
pub(crate) fn sort_buckets<'a, C, S>(
    buckets: Vec<Bucket<'a, C>>,
    collector: &mut OrderedCollector<'a, C>,
    sink: &mut S,
    pool: Option<&ThreadPool>,
    config: &SortConfig,
) -> ControlFlow<()>
where
    C: Orderable + Sync + ?Sized,
    S: PositionSink,
{
    match pool {
        Some(pool) if buckets.len() > config.bucket_group_size => {
            sort_parallel(buckets, collector, sink, pool, config)
        }
        _ => {
            config.trace(format_args!("Sorting {} buckets serially", buckets.len()));
            for mut bucket in buckets {
                bucket.sort();
                collector.accept(bucket, sink)?;
            }
            ControlFlow::Continue(())
        }
    }
}

fn sort_parallel<'a, C, S>(
    buckets: Vec<Bucket<'a, C>>,
    collector: &mut OrderedCollector<'a, C>,
    sink: &mut S,
    pool: &ThreadPool,
    config: &SortConfig,
) -> ControlFlow<()>
where
    C: Orderable + Sync + ?Sized,
    S: PositionSink,
{
    let num_buckets = buckets.len();
    let group_size = config.bucket_group_size;
    let num_groups = num_buckets.div_ceil(group_size);
    config.trace(format_args!(
        "Sorting {num_buckets} buckets in {num_groups} groups on {} threads",
        pool.current_num_threads()
    ));

    let state = DispatchState { cancelled: AtomicBool::new(false), sorted: AtomicUsize::new(0) };
    // Room for every bucket, so reporting never blocks a worker.
    let (tx, rx) = bounded::<Bucket<'a, C>>(num_buckets);

    let flow = pool.in_place_scope(|scope| {
        let mut buckets = buckets.into_iter();
        for _ in 0..num_groups {
            let group: Vec<Bucket<'a, C>> = buckets.by_ref().take(group_size).collect();
            let tx = tx.clone();
            let state = &state;
            scope.spawn(move |_| {
                for mut bucket in group {
                    if state.cancelled.load(Ordering::Relaxed) {
                        return;
                    }
                    bucket.sort();
                    state.sorted.fetch_add(1, Ordering::Relaxed);
                    if tx.send(bucket).is_err() {
                        return;
                    }
                }
            });
        }
        drop(tx);

        // Collect on this thread while the pool sorts.
        for bucket in rx.iter() {
            if collector.accept(bucket, sink).is_break() {
                state.cancelled.store(true, Ordering::Relaxed);
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    });

    if flow.is_break() {
        config.trace(format_args!(
            "Cancelled after sorting {} of {num_buckets} buckets",
            state.sorted.load(Ordering::Relaxed)
        ));
    }
    flow
}
