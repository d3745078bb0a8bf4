//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use picstash_storage::StorageError;
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Core(#[from] picstash_core::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Get the error code for this error.
    ///
    /// Also used as the `reason` label of the rejection counter.
    pub fn code(&self) -> &'static str {
        use picstash_core::Error as CoreError;

        match self {
            Self::BadRequest(_) => "bad_request",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Core(e) => match e {
                CoreError::InvalidDataUrl => "invalid_data_url",
                CoreError::UnsupportedMimeType(_) => "unsupported_mime_type",
                CoreError::InvalidBase64(_) => "invalid_base64",
                CoreError::PayloadTooLarge { .. } => "payload_too_large",
                CoreError::InvalidRecord(_) => "invalid_record",
                CoreError::InvalidSlot(_) => "invalid_slot",
            },
            Self::Storage(e) => match e {
                StorageError::Unavailable(_) | StorageError::Io(_) => "storage_unavailable",
                StorageError::WriteFailed(_) => "storage_write_failed",
                StorageError::InvalidKey(_) | StorageError::Config(_) => "storage_error",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Core(e) => match e {
                picstash_core::Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Storage(e) => match e {
                StorageError::Unavailable(_) | StorageError::Io(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                // Keys come from the resolver, so a rejected key is our bug.
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }

        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
