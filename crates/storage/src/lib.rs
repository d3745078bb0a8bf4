//! Image storage for picstash.
//!
//! This crate provides:
//! - The [`AssetStore`] abstraction over the append-only image tree
//! - Collision-free filename allocation via exclusive file creation
//! - A local filesystem backend

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use error::{StorageError, StorageResult};
pub use traits::{AssetStore, Reservation};

use picstash_core::config::StorageConfig;
use std::sync::Arc;

/// Create an asset store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn AssetStore>> {
    config.validate().map_err(StorageError::Config)?;

    let backend = FilesystemBackend::new(&config.path).await?;
    Ok(Arc::new(backend))
}
