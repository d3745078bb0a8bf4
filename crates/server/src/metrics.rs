//! Prometheus metrics for the picstash server.
//!
//! Exposes counters for stored uploads, rejected requests by reason, slot
//! contention, and upload latency.
//!
//! # Security Note
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping.
//! Metrics carry no record identifiers or filenames, only aggregate counts.
//! Restrict it to scraper networks at the proxy or firewall, or turn it off
//! with `server.metrics_enabled = false`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static UPLOADS_STORED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "picstash_uploads_stored_total",
            "Total number of images stored, by bucket kind",
        ),
        &["bucket"],
    )
    .expect("metric creation failed")
});

pub static BYTES_STORED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "picstash_bytes_stored_total",
        "Total decoded image bytes written to storage",
    )
    .expect("metric creation failed")
});

pub static UPLOAD_REJECTIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "picstash_upload_rejections_total",
            "Total upload requests that failed, by reason",
        ),
        &["reason"],
    )
    .expect("metric creation failed")
});

pub static SLOT_CONFLICTS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "picstash_slot_conflicts_total",
        "Total candidate filenames found already taken during allocation",
    )
    .expect("metric creation failed")
});

pub static UPLOAD_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "picstash_upload_duration_seconds",
            "Time taken to decode, allocate and write an upload",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent, so integration tests can build any number of routers.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(UPLOADS_STORED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(BYTES_STORED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOAD_REJECTIONS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SLOT_CONFLICTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOAD_DURATION.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Record a failed upload under `reason`.
pub fn record_rejection(reason: &str) {
    UPLOAD_REJECTIONS.with_label_values(&[reason]).inc();
}

/// Record a stored upload.
pub fn record_stored(anonymous: bool, size: usize) {
    let bucket = if anonymous { "anonymous" } else { "record" };
    UPLOADS_STORED.with_label_values(&[bucket]).inc();
    BYTES_STORED.inc_by(size as u64);
}
