//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
///
/// Every variant is a validation failure detected before any filesystem
/// mutation takes place.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid data URL: expected data:<mime>;base64,<payload>")]
    InvalidDataUrl,

    #[error("unsupported MIME type: {0}")]
    UnsupportedMimeType(String),

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("invalid record: {0} (must be a non-negative integer)")]
    InvalidRecord(i64),

    #[error("invalid slot: {0} (must be a non-negative integer)")]
    InvalidSlot(i64),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
