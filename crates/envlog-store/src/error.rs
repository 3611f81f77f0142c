//! Error types for envlog-store.

use std::path::PathBuf;

use envlog_types::ValidationError;

/// Result type for envlog-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in envlog-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A sample with this timestamp is already stored.
    #[error("Duplicate timestamp: a sample for {0} already exists")]
    DuplicateTimestamp(i64),

    /// The sample violates the numeric invariants and was not stored.
    #[error("Invalid sample: {0}")]
    InvalidSample(#[from] ValidationError),
}

/// Why a stored row could not be decoded into a sample.
///
/// Row errors never escape a query: the row is skipped and logged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    /// A column holds NULL.
    #[error("column {0} is NULL")]
    Missing(&'static str),

    /// A column holds a value that is not a number (text or blob).
    #[error("column {column} holds {found}, expected a number")]
    NotNumeric {
        column: &'static str,
        found: &'static str,
    },

    /// The timestamp column holds a non-integer number.
    #[error("column time holds non-integer {0}")]
    FractionalTimestamp(f64),

    /// The decoded values violate the sample invariants.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
