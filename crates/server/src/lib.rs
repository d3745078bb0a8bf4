//! HTTP upload service for base64-encoded images.
//!
//! This crate provides the HTTP layer:
//! - `POST /upload` admission pipeline
//! - Base URL resolution for returned links
//! - Static serving of stored images
//! - Health and Prometheus endpoints

pub mod base_url;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
