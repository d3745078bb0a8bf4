//! Server test utilities.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use picstash_core::config::AppConfig;
use picstash_server::{AppState, create_router};
use picstash_storage::{AssetStore, FilesystemBackend};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with a temporary image tree.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        Self::build(modifier, |store| store).await
    }

    /// Create a test server whose filesystem store is wrapped by `wrap`.
    pub async fn with_store<W>(wrap: W) -> Self
    where
        W: FnOnce(Arc<dyn AssetStore>) -> Arc<dyn AssetStore>,
    {
        Self::build(|_| {}, wrap).await
    }

    async fn build<F, W>(modifier: F, wrap: W) -> Self
    where
        F: FnOnce(&mut AppConfig),
        W: FnOnce(Arc<dyn AssetStore>) -> Arc<dyn AssetStore>,
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let storage_path = temp_dir.path().join("imagens");

        let mut config = AppConfig::for_testing(&storage_path);
        modifier(&mut config);

        let store: Arc<dyn AssetStore> = Arc::new(
            FilesystemBackend::new(&config.storage.path)
                .await
                .expect("Failed to create storage backend"),
        );
        let store = wrap(store);

        picstash_server::metrics::register_metrics();

        let state = AppState::new(config, store);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Root of the image tree.
    pub fn storage_root(&self) -> PathBuf {
        self.state.config.storage.path.clone()
    }

    /// POST /upload with a JSON body.
    pub async fn upload(&self, body: Value) -> (StatusCode, Value) {
        self.upload_with_headers(body, &[]).await
    }

    /// POST /upload with a JSON body and extra request headers.
    pub async fn upload_with_headers(
        &self,
        body: Value,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let bytes = serde_json::to_vec(&body).unwrap();
        self.raw_upload(bytes, headers).await
    }

    /// POST /upload with an arbitrary body.
    pub async fn raw_upload(
        &self,
        body: impl Into<Body>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/upload")
            .header("Content-Type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = builder.body(body.into()).unwrap();
        send(&self.router, request).await
    }

    /// GET `uri`, returning status and raw body.
    pub async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }
}

/// Send a request and decode the JSON response body.
pub async fn send(router: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}
