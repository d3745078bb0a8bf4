//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

/// A filename claimed in the image tree.
///
/// Holding a reservation means an empty placeholder exists at `path` and no
/// other writer will be handed the same name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reservation {
    /// Directory key the file lives under (e.g. `123` or `misc`).
    pub directory_key: String,
    /// Allocated filename, `<prefix>-<slot>.<ext>`.
    pub filename: String,
    /// Absolute location of the placeholder.
    pub path: PathBuf,
    /// Slot number embedded in `filename`.
    pub slot: u64,
    /// Candidates that were already taken before this one succeeded.
    pub conflicts: u64,
}

/// Append-only store for uploaded images.
///
/// Files are never deleted or renamed once allocated. Allocation correctness
/// rests entirely on an atomic create-if-absent primitive, so any number of
/// tasks or processes may share one tree.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Create the directory for `directory_key` (and parents) if missing.
    async fn ensure_directory(&self, directory_key: &str) -> StorageResult<()>;

    /// Claim a free `<name_prefix>-<n>.<extension>` filename.
    ///
    /// With a preferred slot `S`, `S` is tried first and the search continues
    /// from `S + 1` if it is taken. Without one, the search starts at 1.
    /// The first candidate that can be exclusively created wins.
    async fn reserve(
        &self,
        directory_key: &str,
        name_prefix: &str,
        extension: &str,
        preferred_slot: Option<u64>,
    ) -> StorageResult<Reservation>;

    /// Replace the placeholder of `reservation` with `data`.
    async fn write(&self, reservation: &Reservation, data: Bytes) -> StorageResult<()>;

    /// Get the backend name (for logging/metrics).
    fn backend_name(&self) -> &'static str;

    /// Check that the store is reachable and usable.
    async fn health_check(&self) -> StorageResult<()>;
}
