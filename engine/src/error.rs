//! Error types for the Tally engine.

use thiserror::Error;

/// All possible errors from the Tally engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Backup errors
    #[error("invalid backup: {0}")]
    InvalidBackup(String),

    #[error("backup is missing required field: {0}")]
    MissingBackupField(&'static str),

    // Persistence errors
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("snapshot key mismatch: expected {expected}, got {actual}")]
    SnapshotKeyMismatch { expected: String, actual: String },

    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
