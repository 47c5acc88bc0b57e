//! Tunable thresholds and the diagnostic trace sink.
//!
//! None of these values affect correctness. They only decide how much work is
//! bucketed and how it is spread over the worker pool.

use std::fmt;
use std::sync::Arc;

use crate::error::{BigSortError, Result};
use crate::partition::{Strategy, choose_strategy};

/// Inputs smaller than this are sorted directly with the full comparator.
pub const DEFAULT_SMALL_INPUT_THRESHOLD: usize = 10_000;

/// Inputs at least this large use the big bucket tier.
pub const DEFAULT_BIG_INPUT_THRESHOLD: usize = 1 << 24;

/// Digest bits used for bucketing in the medium tier (2^16 buckets).
pub const DEFAULT_MEDIUM_BUCKET_BITS: u32 = 16;

/// Digest bits used for bucketing in the big tier (2^24 buckets).
pub const DEFAULT_BIG_BUCKET_BITS: u32 = 24;

/// Number of contiguous buckets sorted by one worker task.
pub const DEFAULT_BUCKET_GROUP_SIZE: usize = 256;

/// Number of positions handed to the consumer per output message.
pub const DEFAULT_OUTPUT_CHUNK_LEN: usize = 4096;

/// Upper bound on bucket bits, which keeps the bucket table addressable.
pub const MAX_BUCKET_BITS: u32 = 32;

/// Receives formatted progress messages from a sort call.
///
/// Purely observational. Each sort call carries its own sink, so concurrent sorts
/// never share diagnostic state.
pub trait TraceSink: Send + Sync {
    /// Records one progress message.
    fn trace(&self, args: fmt::Arguments<'_>);
}

/// Discards every message. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrace;

impl TraceSink for NoopTrace {
    #[inline]
    fn trace(&self, _args: fmt::Arguments<'_>) {}
}

/// Forwards messages to the `log` crate at debug level under the `bigsort` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTrace;

impl TraceSink for LogTrace {
    fn trace(&self, args: fmt::Arguments<'_>) {
        log::debug!(target: "bigsort", "{args}");
    }
}

/// Configuration for a sort call.
///
/// # Examples
///
/// ```
/// use bigsort::config::{LogTrace, SortConfig};
///
/// let config = SortConfig::default()
///     .with_small_input_threshold(1_000)
///     .with_threads(4)
///     .with_trace(LogTrace);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct SortConfig {
    /// Inputs below this size skip bucketing entirely.
    pub small_input_threshold: usize,
    /// Inputs at or above this size use [`big_bucket_bits`](Self::big_bucket_bits).
    pub big_input_threshold: usize,
    /// Bucket bits for inputs between the two thresholds.
    pub medium_bucket_bits: u32,
    /// Bucket bits for inputs at or above the big threshold.
    pub big_bucket_bits: u32,
    /// Buckets per worker task. Tables no larger than this are sorted serially.
    pub bucket_group_size: usize,
    /// Worker threads. `None` uses rayon's default (one per logical CPU).
    pub threads: Option<usize>,
    /// Positions per message on the output hand-off.
    pub output_chunk_len: usize,
    /// Diagnostic sink.
    pub trace: Arc<dyn TraceSink>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            small_input_threshold: DEFAULT_SMALL_INPUT_THRESHOLD,
            big_input_threshold: DEFAULT_BIG_INPUT_THRESHOLD,
            medium_bucket_bits: DEFAULT_MEDIUM_BUCKET_BITS,
            big_bucket_bits: DEFAULT_BIG_BUCKET_BITS,
            bucket_group_size: DEFAULT_BUCKET_GROUP_SIZE,
            threads: None,
            output_chunk_len: DEFAULT_OUTPUT_CHUNK_LEN,
            trace: Arc::new(NoopTrace),
        }
    }
}

impl fmt::Debug for SortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortConfig")
            .field("small_input_threshold", &self.small_input_threshold)
            .field("big_input_threshold", &self.big_input_threshold)
            .field("medium_bucket_bits", &self.medium_bucket_bits)
            .field("big_bucket_bits", &self.big_bucket_bits)
            .field("bucket_group_size", &self.bucket_group_size)
            .field("threads", &self.threads)
            .field("output_chunk_len", &self.output_chunk_len)
            .finish_non_exhaustive()
    }
}

impl SortConfig {
    #[must_use]
    pub fn with_small_input_threshold(mut self, threshold: usize) -> Self {
        self.small_input_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_big_input_threshold(mut self, threshold: usize) -> Self {
        self.big_input_threshold = threshold;
        self
    }

    /// Sets the bucket bits of the medium and big tiers.
    #[must_use]
    pub fn with_bucket_bits(mut self, medium: u32, big: u32) -> Self {
        self.medium_bucket_bits = medium;
        self.big_bucket_bits = big;
        self
    }

    #[must_use]
    pub fn with_bucket_group_size(mut self, group_size: usize) -> Self {
        self.bucket_group_size = group_size;
        self
    }

    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    #[must_use]
    pub fn with_output_chunk_len(mut self, len: usize) -> Self {
        self.output_chunk_len = len;
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace: impl TraceSink + 'static) -> Self {
        self.trace = Arc::new(trace);
        self
    }

    /// Checks that every field is usable.
    ///
    /// # Errors
    ///
    /// Returns [`BigSortError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.small_input_threshold > self.big_input_threshold {
            return Err(invalid(
                "small_input_threshold",
                format!(
                    "{} exceeds big_input_threshold {}",
                    self.small_input_threshold, self.big_input_threshold
                ),
            ));
        }
        for (parameter, bits) in [
            ("medium_bucket_bits", self.medium_bucket_bits),
            ("big_bucket_bits", self.big_bucket_bits),
        ] {
            if bits == 0 || bits > MAX_BUCKET_BITS {
                return Err(invalid(
                    parameter,
                    format!("{bits} is outside 1..={MAX_BUCKET_BITS}"),
                ));
            }
        }
        if self.bucket_group_size == 0 {
            return Err(invalid("bucket_group_size", "must be >= 1".to_string()));
        }
        if self.threads == Some(0) {
            return Err(invalid("threads", "must be >= 1".to_string()));
        }
        if self.output_chunk_len == 0 {
            return Err(invalid("output_chunk_len", "must be >= 1".to_string()));
        }
        Ok(())
    }

    /// The strategy a sort of `len` items with a `digest_bits`-wide digest would use.
    #[must_use]
    pub fn strategy_for(&self, len: usize, digest_bits: u32) -> Strategy {
        choose_strategy(len, self, digest_bits)
    }

    pub(crate) fn trace(&self, args: fmt::Arguments<'_>) {
        self.trace.trace(args);
    }
}

fn invalid(parameter: &'static str, reason: String) -> BigSortError {
    BigSortError::InvalidConfig { parameter, reason }
}
