//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The image tree cannot be used: the directory is missing, unwritable,
    /// or a placeholder could not be created.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A reserved file could not be filled with its content.
    #[error("storage write failed: {0}")]
    WriteFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
