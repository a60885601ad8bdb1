//! Error types for proximity.

use thiserror::Error;

/// Errors surfaced by index construction, mutation, search and snapshots.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Unknown similarity tag passed to [`AnyIndex::create`](crate::AnyIndex::create).
    #[error("unsupported similarity: {0:?}")]
    UnsupportedSimilarity(String),

    /// Inserted or queried point does not match the configured format.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The memory budget cannot fit the dataset plus a single hash table.
    #[error("memory budget of {budget} bytes cannot fit a single repetition")]
    InsufficientMemory { budget: u64 },

    /// Snapshot data failed validation while loading.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// Search was issued before the index was ever rebuilt.
    #[error("index has not been rebuilt")]
    EmptyIndex,

    /// Reading or writing a snapshot failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for proximity operations.
pub type Result<T> = std::result::Result<T, IndexError>;
