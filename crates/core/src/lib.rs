//! Core domain types and shared logic for picstash.
//!
//! This crate defines the upload admission pipeline that the other crates
//! build on:
//! - Data URL decoding with the image MIME allowlist and size limit
//! - Record/slot resolution and the directory naming scheme
//! - Upload wire types
//! - Configuration shared by server and storage

pub mod config;
pub mod data_url;
pub mod error;
pub mod identifiers;
pub mod upload;

pub use data_url::{DecodedPayload, ImageMime};
pub use error::{Error, Result};
pub use identifiers::{ANONYMOUS_BUCKET, FilenameHint, Resolution};
pub use upload::{StoredAsset, UploadRequest, UploadResponse};

/// Maximum decoded image size: 25 MiB
pub const MAX_PAYLOAD_SIZE: usize = 25 * 1024 * 1024;

/// Room left in a request body for JSON framing and the other fields.
const REQUEST_OVERHEAD: usize = 64 * 1024;

/// Smallest request body able to carry a maximum-size image.
pub const fn max_encoded_request_size() -> usize {
    MAX_PAYLOAD_SIZE.div_ceil(3) * 4 + REQUEST_OVERHEAD
}
