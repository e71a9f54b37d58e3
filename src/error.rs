//! Error types for the storage and command layers.
//!
//! The recurrence engine and the urgency classifier are total functions and
//! never produce these; only I/O and user input can fail.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem error while reading or writing data files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A data or backup file could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid date '{0}', use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("unknown periodicity '{0}', supported: none, 30d, 3m, 6m, 1y, custom")]
    InvalidPeriodicity(String),

    #[error("task {0} not found")]
    TaskNotFound(String),

    /// An id prefix matched more than one task.
    #[error("id prefix '{0}' matches {1} tasks")]
    AmbiguousId(String, usize),

    #[error("category '{0}' not found")]
    CategoryNotFound(String),

    /// Refused to delete a category that tasks still reference.
    #[error("category '{0}' is used by {1} task(s)")]
    CategoryInUse(String, usize),

    #[error("invalid backup file: {0}")]
    InvalidBackup(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, Error>;
