//! Upload endpoint.
//!
//! `POST /upload` runs the admission pipeline for a single image:
//! decode the data URL, resolve record and slot, claim a filename, write the
//! bytes, and answer with a link to the stored file.
//!
//! Nothing touches the filesystem until every validation step has passed,
//! so a rejected request never leaves a file behind.

use crate::base_url::resolve_base_url;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::{HeaderMap, StatusCode, Uri};
use bytes::Bytes;
use picstash_core::{
    MAX_PAYLOAD_SIZE, StoredAsset, UploadRequest, UploadResponse, data_url, identifiers,
};

/// POST /upload - Store a base64-encoded image.
#[tracing::instrument(
    skip(state, headers, body),
    fields(filename, record, slot, stored_as)
)]
pub async fn upload(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let timer = metrics::UPLOAD_DURATION.start_timer();

    let result = store_upload(&state, &uri, &headers, body).await;
    match &result {
        Ok(_) => timer.observe_duration(),
        Err(e) => {
            timer.stop_and_discard();
            metrics::record_rejection(e.code());
            if !e.status_code().is_server_error() {
                tracing::info!(code = e.code(), error = %e, "Upload rejected");
            }
        }
    }

    result.map(Json)
}

async fn store_upload(
    state: &AppState,
    uri: &Uri,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<UploadResponse> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(format!(
                "request body exceeds {} bytes",
                state.config.server.max_body_size
            ))
        } else {
            ApiError::BadRequest(format!("failed to read body: {}", rejection.body_text()))
        }
    })?;

    let req: UploadRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))?;

    let span = tracing::Span::current();
    span.record("filename", req.filename.as_str());

    let payload = data_url::decode(&req.data_url, MAX_PAYLOAD_SIZE)?;
    let resolution =
        identifiers::resolve(&req.filename, req.record, req.slot, payload.extension())?;

    if let Some(record) = resolution.record {
        span.record("record", record);
    }
    if let Some(slot) = resolution.slot {
        span.record("slot", slot);
    }

    state
        .store
        .ensure_directory(&resolution.directory_key)
        .await?;

    let reservation = state
        .store
        .reserve(
            &resolution.directory_key,
            &resolution.name_prefix,
            payload.extension(),
            resolution.slot,
        )
        .await?;

    if reservation.conflicts > 0 {
        metrics::SLOT_CONFLICTS.inc_by(reservation.conflicts);
        tracing::debug!(
            directory = %reservation.directory_key,
            filename = %reservation.filename,
            conflicts = reservation.conflicts,
            "Allocated after slot conflicts"
        );
    }

    let mime = payload.mime;
    let size = payload.size();
    state
        .store
        .write(&reservation, Bytes::from(payload.bytes))
        .await?;

    let asset = StoredAsset::new(
        &reservation.directory_key,
        reservation.filename.as_str(),
        reservation.path.clone(),
    );
    span.record("stored_as", asset.public_path.as_str());

    metrics::record_stored(resolution.is_anonymous(), size);
    tracing::info!(
        path = %asset.full_path.display(),
        mime = %mime,
        size,
        "Stored upload"
    );

    let base_url = resolve_base_url(&state.config.server, headers, uri);

    Ok(UploadResponse {
        link: format!("{base_url}{}", asset.public_path),
        mime,
        size,
        record: resolution.record,
        slot: resolution.slot,
        path: asset.public_path,
    })
}
