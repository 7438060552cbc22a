//! Error types for Trueno-Bandit
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trueno-Bandit error types
#[derive(Error, Debug)]
pub enum Error {
    /// Experiment identifier absent at read or update time
    #[error("Experiment not found: {0}\nIt was never created or has been deleted")]
    NotFound(String),

    /// Malformed identifier, out-of-range arm index, or invalid configuration
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Per-experiment exclusive section not acquired in time (retryable)
    #[error("Timed out after {waited_ms}ms waiting for exclusive access to experiment {experiment_id}\nThe experiment is under heavy contention; retry the request")]
    Timeout {
        /// Experiment whose lock could not be acquired
        experiment_id: String,
        /// Configured wait bound in milliseconds
        waited_ms: u128,
    },

    /// Persistence collaborator failure or corrupt record
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Record encoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller may retry the failed operation unchanged.
    ///
    /// The engine never retries internally: it has no request identity to
    /// deduplicate a replayed reward.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
