//! Error types for the Grove library.
//!
//! Only batch-level failures are errors. Problems with an individual row are
//! reported as data ([`crate::validation::FieldIssue`]) inside the result.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for Grove operations.
#[derive(Debug, Error)]
pub enum GroveError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The submission failed the structural precheck.
    #[error("Structure error: {}", .0.join("; "))]
    Structure(Vec<String>),

    /// A store lookup failed.
    ///
    /// Raised by [`crate::duplicates::RecordLookup`] implementations. The
    /// duplicate detector logs and skips these; they never abort a batch.
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// The run was cancelled by the caller.
    #[error("Validation cancelled")]
    Cancelled,

    /// The run exceeded its configured time budget.
    #[error("Validation timed out after {0:?}")]
    TimedOut(Duration),

    /// A validation worker panicked or was aborted.
    #[error("Worker error: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Result type alias for Grove operations.
pub type Result<T> = std::result::Result<T, GroveError>;
