//! Ordered collection of sorted buckets.
//!
//! Buckets finish sorting in whatever order the worker pool schedules them. The
//! collector parks each finished bucket in its ordinal slot and releases buckets
//! strictly in ordinal order, emitting a contiguous run of finished buckets in one
//! burst as soon as the run's first bucket arrives.

use std::ops::ControlFlow;

use crossbeam_channel::Sender;

use crate::bucket::Bucket;
use crate::core::Orderable;

/// Destination for emitted positions.
///
/// Returning [`ControlFlow::Break`] tells the collector the consumer is gone.
pub(crate) trait PositionSink {
    fn emit(&mut self, positions: impl ExactSizeIterator<Item = usize>) -> ControlFlow<()>;

    /// Called once after the last bucket has been emitted.
    fn finish(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl PositionSink for Vec<usize> {
    fn emit(&mut self, positions: impl ExactSizeIterator<Item = usize>) -> ControlFlow<()> {
        self.extend(positions);
        ControlFlow::Continue(())
    }
}

/// Coalesces positions into chunks of at least `chunk_len` before sending them.
pub(crate) struct ChunkedSender {
    sender: Sender<Vec<usize>>,
    pending: Vec<usize>,
    chunk_len: usize,
}

impl ChunkedSender {
    pub fn new(sender: Sender<Vec<usize>>, chunk_len: usize) -> Self {
        Self { sender, pending: Vec::with_capacity(chunk_len), chunk_len }
    }

    fn flush(&mut self) -> ControlFlow<()> {
        if self.pending.is_empty() {
            return ControlFlow::Continue(());
        }
        let chunk = std::mem::replace(&mut self.pending, Vec::with_capacity(self.chunk_len));
        match self.sender.send(chunk) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    }
}

impl PositionSink for ChunkedSender {
    fn emit(&mut self, positions: impl ExactSizeIterator<Item = usize>) -> ControlFlow<()> {
        self.pending.extend(positions);
        if self.pending.len() >= self.chunk_len {
            return self.flush();
        }
        ControlFlow::Continue(())
    }

    fn finish(&mut self) -> ControlFlow<()> {
        self.flush()
    }
}

/// Releases sorted buckets in ascending ordinal order.
pub(crate) struct OrderedCollector<'a, C: Orderable + ?Sized> {
    /// Finished buckets waiting on a predecessor, indexed by ordinal.
    parked: Vec<Option<Bucket<'a, C>>>,
    /// Ordinal of the next bucket to emit.
    next_due: usize,
    /// Number of buckets reported so far.
    notified: usize,
    emitted_positions: usize,
    expected_positions: usize,
}

impl<'a, C: Orderable + ?Sized> OrderedCollector<'a, C> {
    pub fn new(num_buckets: usize, expected_positions: usize) -> Self {
        Self {
            parked: (0..num_buckets).map(|_| None).collect(),
            next_due: 0,
            notified: 0,
            emitted_positions: 0,
            expected_positions,
        }
    }

    /// Records a finished bucket and emits every bucket that is now due.
    ///
    /// # Panics
    ///
    /// Panics if the bucket is unsorted, out of range, or was already reported.
    pub fn accept<S: PositionSink>(
        &mut self,
        bucket: Bucket<'a, C>,
        sink: &mut S,
    ) -> ControlFlow<()> {
        let ordinal = bucket.ordinal();
        assert!(bucket.is_sorted(), "bucket {ordinal} reported before it was sorted");
        let vacant = self.parked.get(ordinal).is_some_and(Option::is_none);
        assert!(
            ordinal >= self.next_due && vacant,
            "bucket {ordinal} reported twice or out of range ({} buckets)",
            self.parked.len()
        );

        self.notified += 1;
        self.parked[ordinal] = Some(bucket);
        if ordinal != self.next_due {
            return ControlFlow::Continue(());
        }
        self.drain_ready(sink)
    }

    /// Emits the due bucket and every already-finished bucket contiguous with it.
    fn drain_ready<S: PositionSink>(&mut self, sink: &mut S) -> ControlFlow<()> {
        while let Some(bucket) = self.parked.get_mut(self.next_due).and_then(Option::take) {
            self.next_due += 1;
            self.emit(&bucket, sink)?;
        }
        ControlFlow::Continue(())
    }

    fn emit<S: PositionSink>(&mut self, bucket: &Bucket<'a, C>, sink: &mut S) -> ControlFlow<()> {
        self.emitted_positions += bucket.len();
        sink.emit(bucket.positions())
    }

    /// Flushes any parked buckets in ordinal order and closes the sink.
    ///
    /// # Panics
    ///
    /// Panics if a bucket was never reported, or if the number of emitted positions
    /// differs from the input size.
    pub fn finish<S: PositionSink>(mut self, sink: &mut S) -> ControlFlow<()> {
        assert_eq!(
            self.notified,
            self.parked.len(),
            "collector finished with {} of {} buckets reported",
            self.notified,
            self.parked.len()
        );

        for ordinal in self.next_due..self.parked.len() {
            let bucket = self.parked[ordinal]
                .take()
                .unwrap_or_else(|| panic!("bucket {ordinal} was never parked"));
            self.next_due = ordinal + 1;
            self.emit(&bucket, sink)?;
        }

        assert_eq!(
            self.emitted_positions, self.expected_positions,
            "emitted {} positions for an input of {}",
            self.emitted_positions, self.expected_positions
        );
        sink.finish()
    }
}
