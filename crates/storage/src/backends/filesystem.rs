//! Local filesystem storage backend.

use crate::error::{StorageError, StorageResult};
use crate::traits::{AssetStore, Reservation};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// First slot tried when no slot is preferred.
const FIRST_SLOT: u64 = 1;

/// Local filesystem image tree.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend, creating the root if needed.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::Unavailable(format!(
                "failed to create storage root {}: {e}",
                root.display()
            ))
        })?;
        let root = fs::canonicalize(&root).await?;
        Ok(Self { root })
    }

    /// Root directory of the tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the directory path for a key, with path traversal protection.
    ///
    /// Runs `key_path_sync` on the blocking pool since it stats and
    /// canonicalizes paths.
    async fn key_path(&self, directory_key: &str) -> StorageResult<PathBuf> {
        let root = self.root.clone();
        let key = directory_key.to_string();
        tokio::task::spawn_blocking(move || Self::key_path_sync(&root, &key))
            .await
            .map_err(|e| {
                StorageError::Io(std::io::Error::other(format!("spawn_blocking failed: {e}")))
            })?
    }

    /// Synchronous key validation.
    ///
    /// Returns an error if the key would escape the storage root, including
    /// through a symlinked directory.
    fn key_path_sync(root: &Path, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidKey(format!(
                "path traversal not allowed: {key:?}"
            )));
        }

        for component in Path::new(key).components() {
            if !matches!(component, Component::Normal(_)) {
                return Err(StorageError::InvalidKey(format!(
                    "contains unsafe path component: {key}"
                )));
            }
        }

        let path = root.join(key);

        // Walk up from the target to the nearest existing ancestor and make
        // sure it resolves inside the root. Catches root/a -> /elsewhere.
        let mut candidate = Some(path.as_path());
        while let Some(current) = candidate {
            match std::fs::symlink_metadata(current) {
                Ok(_) => {
                    let canonical = current.canonicalize().map_err(|_| {
                        StorageError::InvalidKey(format!("symlink target missing or invalid: {key}"))
                    })?;
                    if !canonical.starts_with(root) {
                        return Err(StorageError::InvalidKey(format!(
                            "resolved path escapes storage root: {key}"
                        )));
                    }
                    break;
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(StorageError::Unavailable(format!(
                        "failed to stat {}: {err}",
                        current.display()
                    )));
                }
            }
            candidate = current.parent();
        }

        Ok(path)
    }

    /// Reject name parts that could smuggle a separator into a filename.
    fn validate_name_part(kind: &str, value: &str) -> StorageResult<()> {
        if value.is_empty()
            || value.starts_with('.')
            || value.contains(['/', '\\', '\0'])
        {
            return Err(StorageError::InvalidKey(format!("invalid {kind}: {value:?}")));
        }
        Ok(())
    }

    /// Atomically create an empty file at `path` if nothing exists there.
    ///
    /// Returns `Ok(false)` when the name is already taken. This is the only
    /// collision check; there is no separate existence probe.
    async fn create_exclusive(path: &Path) -> StorageResult<bool> {
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(StorageError::Unavailable(format!(
                "failed to create {}: {e}",
                path.display()
            ))),
        }
    }

    /// Sequential search starting at `start`.
    async fn claim_from(
        dir: &Path,
        name_prefix: &str,
        extension: &str,
        start: u64,
    ) -> StorageResult<(u64, String, u64)> {
        let mut slot = start;
        let mut conflicts = 0;
        loop {
            let filename = slot_filename(name_prefix, slot, extension);
            if Self::create_exclusive(&dir.join(&filename)).await? {
                return Ok((slot, filename, conflicts));
            }
            tracing::debug!(filename = %filename, "slot taken, trying next");
            conflicts += 1;
            slot = next_slot(slot)?;
        }
    }
}

/// Filename for a slot in a sequence.
pub fn slot_filename(name_prefix: &str, slot: u64, extension: &str) -> String {
    format!("{name_prefix}-{slot}.{extension}")
}

fn next_slot(slot: u64) -> StorageResult<u64> {
    slot.checked_add(1)
        .ok_or_else(|| StorageError::Unavailable("slot sequence exhausted".to_string()))
}

#[async_trait]
impl AssetStore for FilesystemBackend {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn ensure_directory(&self, directory_key: &str) -> StorageResult<()> {
        let path = self.key_path(directory_key).await?;
        fs::create_dir_all(&path).await.map_err(|e| {
            StorageError::Unavailable(format!(
                "failed to create directory {}: {e}",
                path.display()
            ))
        })
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn reserve(
        &self,
        directory_key: &str,
        name_prefix: &str,
        extension: &str,
        preferred_slot: Option<u64>,
    ) -> StorageResult<Reservation> {
        Self::validate_name_part("name prefix", name_prefix)?;
        Self::validate_name_part("extension", extension)?;
        let dir = self.key_path(directory_key).await?;

        let (slot, filename, conflicts) = match preferred_slot {
            Some(preferred) => {
                let filename = slot_filename(name_prefix, preferred, extension);
                if Self::create_exclusive(&dir.join(&filename)).await? {
                    (preferred, filename, 0)
                } else {
                    tracing::debug!(
                        filename = %filename,
                        "preferred slot taken, searching for next free slot"
                    );
                    let (slot, filename, conflicts) =
                        Self::claim_from(&dir, name_prefix, extension, next_slot(preferred)?)
                            .await?;
                    (slot, filename, conflicts + 1)
                }
            }
            None => Self::claim_from(&dir, name_prefix, extension, FIRST_SLOT).await?,
        };

        Ok(Reservation {
            directory_key: directory_key.to_string(),
            path: dir.join(&filename),
            filename,
            slot,
            conflicts,
        })
    }

    #[instrument(skip(self, data), fields(backend = "filesystem", size = data.len()))]
    async fn write(&self, reservation: &Reservation, data: Bytes) -> StorageResult<()> {
        let path = &reservation.path;

        // Write to a uniquely named sibling, fsync, then rename over the
        // placeholder so readers never observe a half-written image.
        let temp_path = path.with_file_name(format!(
            ".{}.tmp.{}",
            reservation.filename,
            Uuid::new_v4()
        ));

        let result: std::io::Result<()> = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, path).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::WriteFailed(format!(
                "failed to write {}: {e}",
                path.display()
            )));
        }

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            StorageError::Unavailable(format!("storage root not accessible: {e}"))
        })?;

        if !metadata.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "storage root is not a directory: {:?}",
                self.root
            )));
        }

        Ok(())
    }
}
