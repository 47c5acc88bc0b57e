//! Error types for bigsort operations.

use thiserror::Error;

/// Result type alias for bigsort operations.
pub type Result<T> = std::result::Result<T, BigSortError>;

/// Error type for bigsort operations.
///
/// Only setup can fail. Once a sort is running it either completes or panics on a
/// broken internal invariant.
#[derive(Error, Debug)]
pub enum BigSortError {
    /// A [`SortConfig`](crate::config::SortConfig) field holds an unusable value.
    #[error("Invalid configuration '{parameter}': {reason}")]
    InvalidConfig {
        /// The configuration field name
        parameter: &'static str,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// The worker pool for parallel bucket sorting could not be started.
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// The background thread running the sort could not be spawned.
    #[error("Failed to spawn sort pipeline thread: {0}")]
    Spawn(#[from] std::io::Error),
}
