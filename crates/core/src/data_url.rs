//! Data URL parsing and payload validation.

use crate::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Image content types accepted for upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageMime {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/webp")]
    Webp,
}

impl ImageMime {
    /// Look up an allowed MIME type by its exact name.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// File extension used for stored files of this type.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, decoded image payload.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    pub mime: ImageMime,
    pub bytes: Vec<u8>,
}

impl DecodedPayload {
    pub fn extension(&self) -> &'static str {
        self.mime.extension()
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for DecodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedPayload")
            .field("mime", &self.mime)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Decode a `data:<mime>;base64,<payload>` string.
///
/// Checks run in order: shape, MIME allowlist, base64 validity, decoded size.
/// The base64 engine is strict: canonical padding is required and no
/// characters outside the standard alphabet are skipped.
pub fn decode(data_url: &str, max_size: usize) -> Result<DecodedPayload> {
    let (mime, payload) = split_data_url(data_url)?;

    let mime = ImageMime::from_mime(mime)
        .ok_or_else(|| Error::UnsupportedMimeType(mime.to_string()))?;

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| Error::InvalidBase64(e.to_string()))?;

    if bytes.len() > max_size {
        return Err(Error::PayloadTooLarge { limit: max_size });
    }

    Ok(DecodedPayload { mime, bytes })
}

/// Split a data URL into its MIME type and encoded payload.
fn split_data_url(data_url: &str) -> Result<(&str, &str)> {
    let rest = data_url
        .strip_prefix(SCHEME)
        .ok_or(Error::InvalidDataUrl)?;
    let (mime, payload) = rest.split_once(BASE64_MARKER).ok_or(Error::InvalidDataUrl)?;

    if mime.is_empty() || payload.is_empty() {
        return Err(Error::InvalidDataUrl);
    }

    // Same character class a MIME token may use: word characters plus - . + /
    if !mime
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+' | '/'))
    {
        return Err(Error::InvalidDataUrl);
    }

    Ok((mime, payload))
}
