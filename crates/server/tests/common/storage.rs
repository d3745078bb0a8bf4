//! Storage test utilities.

use async_trait::async_trait;
use bytes::Bytes;
use picstash_storage::{AssetStore, Reservation, StorageResult};
use std::sync::Arc;

/// Store that deletes a reservation's directory right before writing to it,
/// so the final write hits a real I/O failure.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct VanishingDirectoryStore {
    inner: Arc<dyn AssetStore>,
}

#[allow(dead_code)]
impl VanishingDirectoryStore {
    pub fn wrap(inner: Arc<dyn AssetStore>) -> Arc<dyn AssetStore> {
        Arc::new(Self { inner })
    }
}

#[async_trait]
impl AssetStore for VanishingDirectoryStore {
    async fn ensure_directory(&self, directory_key: &str) -> StorageResult<()> {
        self.inner.ensure_directory(directory_key).await
    }

    async fn reserve(
        &self,
        directory_key: &str,
        name_prefix: &str,
        extension: &str,
        preferred_slot: Option<u64>,
    ) -> StorageResult<Reservation> {
        self.inner
            .reserve(directory_key, name_prefix, extension, preferred_slot)
            .await
    }

    async fn write(&self, reservation: &Reservation, data: Bytes) -> StorageResult<()> {
        if let Some(dir) = reservation.path.parent() {
            std::fs::remove_dir_all(dir).expect("Failed to remove reservation directory");
        }
        self.inner.write(reservation, data).await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.inner.health_check().await
    }
}
