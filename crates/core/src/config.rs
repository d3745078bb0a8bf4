//! Configuration types shared across crates.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8002").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Externally visible base URL used to build asset links
    /// (e.g., "https://img.example.com"). When unset, the base URL is derived
    /// from forwarded headers or the request itself.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Maximum accepted request body size in bytes.
    /// Must leave room for a base64-encoded payload of `MAX_PAYLOAD_SIZE`.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8002".to_string()
}

fn default_max_body_size() -> usize {
    40 * 1024 * 1024
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_base_url: None,
            max_body_size: default_max_body_size(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        let min_body = crate::max_encoded_request_size();
        if self.max_body_size < min_body {
            return Err(format!(
                "server.max_body_size {} is too small to carry a {} byte image (need at least {})",
                self.max_body_size,
                crate::MAX_PAYLOAD_SIZE,
                min_body
            ));
        }

        if let Some(base) = &self.public_base_url
            && !(base.starts_with("http://") || base.starts_with("https://"))
        {
            return Err(format!(
                "server.public_base_url must start with http:// or https://, got {base}"
            ));
        }

        Ok(())
    }

    /// Configured public base URL without a trailing slash.
    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }
}

/// Storage configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the image tree.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./imagens")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("storage.path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// CORS configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins. Accepts a list or a comma-separated string
    /// (so `PICSTASH_CORS__ALLOWED_ORIGINS=https://a,https://b` works).
    /// A single `*` allows any origin.
    #[serde(
        default = "default_allowed_origins",
        deserialize_with = "deserialize_origins"
    )]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl CorsConfig {
    /// Whether any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OriginList {
    Csv(String),
    List(Vec<String>),
}

fn deserialize_origins<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match OriginList::deserialize(deserializer)? {
        OriginList::Csv(csv) => csv.split(',').map(String::from).collect(),
        OriginList::List(list) => list,
    };

    Ok(raw
        .into_iter()
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect())
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

impl AppConfig {
    /// Create a test configuration rooted at `storage_path`.
    ///
    /// **For testing only.** Metrics stay enabled and no public base URL is set.
    pub fn for_testing(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig {
                path: storage_path.into(),
            },
            cors: CorsConfig::default(),
        }
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}
