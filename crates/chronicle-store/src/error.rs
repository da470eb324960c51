//! Error types for the persistence layer.
//!
//! [`StoreError`] covers the read path (discovery and aggregation). The
//! write path deliberately has no error channel: a writer failure is logged
//! and the event discarded, because observability must never take the host
//! simulation down with it.

use chronicle_types::RunId;

/// Errors that can occur in the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested run has no event directory.
    #[error("unknown run: {0}")]
    RunNotFound(RunId),
}
