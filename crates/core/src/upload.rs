//! Upload request/response wire types and the stored asset record.

use crate::data_url::ImageMime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// URL prefix under which stored images are served.
pub const PUBLIC_PREFIX: &str = "/images";

/// Request to store an image.
#[derive(Clone, Deserialize, Serialize)]
pub struct UploadRequest {
    /// Client filename. Advisory only; used to recover record/slot hints.
    #[serde(default)]
    pub filename: String,
    /// `data:<mime>;base64,<payload>` encoded image.
    pub data_url: String,
    /// Record identifier. Signed so that negative values reach validation.
    #[serde(default, rename = "registro")]
    pub record: Option<i64>,
    /// Preferred slot within the record.
    #[serde(default, rename = "ponto")]
    pub slot: Option<i64>,
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("filename", &self.filename)
            .field("data_url_len", &self.data_url.len())
            .field("record", &self.record)
            .field("slot", &self.slot)
            .finish()
    }
}

/// Response describing a stored image.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    /// Absolute URL of the stored image.
    pub link: String,
    /// Content type of the stored image.
    pub mime: ImageMime,
    /// Stored size in bytes.
    pub size: usize,
    /// Resolved record, `null` for anonymous uploads.
    #[serde(rename = "registro")]
    pub record: Option<u64>,
    /// Requested slot (explicit or from the filename). The stored filename
    /// may carry a higher slot if this one was taken.
    #[serde(rename = "ponto")]
    pub slot: Option<u64>,
    /// Public path of the stored image, relative to the base URL.
    pub path: String,
}

/// A file that has been written into the image tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredAsset {
    /// Final filename, e.g. `123-5.png`.
    pub filename: String,
    /// Absolute location on disk.
    pub full_path: PathBuf,
    /// Public path, e.g. `/images/123/123-5.png`.
    pub public_path: String,
}

impl StoredAsset {
    pub fn new(directory_key: &str, filename: impl Into<String>, full_path: PathBuf) -> Self {
        let filename = filename.into();
        Self {
            public_path: public_path(directory_key, &filename),
            filename,
            full_path,
        }
    }
}

/// Public path for a file in a storage directory.
pub fn public_path(directory_key: &str, filename: &str) -> String {
    format!("{PUBLIC_PREFIX}/{directory_key}/{filename}")
}
