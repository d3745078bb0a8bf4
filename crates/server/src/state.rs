//! Application state shared across handlers.

use picstash_core::config::AppConfig;
use picstash_storage::AssetStore;
use std::sync::Arc;

/// Shared application state.
///
/// Read-only after startup; every request works against the same config and
/// store handle.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Image store.
    pub store: Arc<dyn AssetStore>,
}

impl AppState {
    /// Create new application state.
    ///
    /// The configuration is expected to have passed [`AppConfig::validate`].
    pub fn new(config: AppConfig, store: Arc<dyn AssetStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
