//! Record/slot resolution and the storage naming scheme.
//!
//! Uploads are grouped by a numeric *record* (one directory per record) and
//! numbered within it by a *slot*. Both may be given explicitly or recovered
//! from a client filename of the form `<record>-<slot>.<ext>`. Uploads with no
//! record land in the anonymous [`ANONYMOUS_BUCKET`] under a random prefix.

use crate::{Error, Result};
use uuid::Uuid;

/// Directory used for uploads that carry no record identifier.
pub const ANONYMOUS_BUCKET: &str = "misc";

/// Length of the random name prefix given to anonymous uploads.
pub const ANONYMOUS_PREFIX_LEN: usize = 8;

/// Extensions recognised when parsing `<record>-<slot>.<ext>` filenames.
const HINT_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Record and slot recovered from a structured filename.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilenameHint {
    pub record: u64,
    pub slot: u64,
}

impl FilenameHint {
    /// Parse `<digits>-<digits>.<jpg|jpeg|png|webp>`, case-insensitively.
    ///
    /// Any deviation from the grammar yields `None`; there are no partial
    /// matches.
    pub fn parse(filename: &str) -> Option<Self> {
        let lowered = filename.to_ascii_lowercase();
        let (stem, extension) = lowered.rsplit_once('.')?;
        if !HINT_EXTENSIONS.contains(&extension) {
            return None;
        }

        let (record, slot) = stem.rsplit_once('-')?;
        Some(Self {
            record: parse_digits(record)?,
            slot: parse_digits(slot)?,
        })
    }
}

/// Parse a non-empty run of ASCII digits.
fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Reduce a client-supplied filename to its last path segment.
///
/// Both `/` and `\` count as separators. An empty result is replaced with
/// `upload.<extension>`.
pub fn sanitize_filename(filename: &str, extension: &str) -> String {
    let last = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    if last.is_empty() {
        format!("upload.{extension}")
    } else {
        last.to_string()
    }
}

/// Where an upload will be stored and how it will be named.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved record, `None` for anonymous uploads.
    pub record: Option<u64>,
    /// Requested slot, if any. The stored slot may end up higher.
    pub slot: Option<u64>,
    /// Directory (relative to the storage root) holding the file.
    pub directory_key: String,
    /// Prefix of every filename in the sequence: `<prefix>-<n>.<ext>`.
    pub name_prefix: String,
}

impl Resolution {
    pub fn is_anonymous(&self) -> bool {
        self.record.is_none()
    }
}

/// Resolve record, slot and naming for an upload.
///
/// Explicit values win; the filename only fills fields left unspecified.
/// Negative explicit values are rejected, never clamped.
pub fn resolve(
    filename: &str,
    record: Option<i64>,
    slot: Option<i64>,
    extension: &str,
) -> Result<Resolution> {
    let filename = sanitize_filename(filename, extension);
    let hint = FilenameHint::parse(&filename);

    let record = match record {
        Some(value) => Some(u64::try_from(value).map_err(|_| Error::InvalidRecord(value))?),
        None => hint.map(|h| h.record),
    };
    let slot = match slot {
        Some(value) => Some(u64::try_from(value).map_err(|_| Error::InvalidSlot(value))?),
        None => hint.map(|h| h.slot),
    };

    let (directory_key, name_prefix) = match record {
        Some(record) => (record.to_string(), record.to_string()),
        None => (ANONYMOUS_BUCKET.to_string(), anonymous_prefix()),
    };

    Ok(Resolution {
        record,
        slot,
        directory_key,
        name_prefix,
    })
}

/// Short random hex token used as the name prefix in the anonymous bucket.
pub fn anonymous_prefix() -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(ANONYMOUS_PREFIX_LEN);
    token
}
