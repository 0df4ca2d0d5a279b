//! Stream processor: consumes published events, maintains sliding
//! windows, evaluates the fixed rule set, and emits derived metrics and
//! alert triggers onto the message fabric.

pub mod actions;
pub mod config;
pub mod metrics;
pub mod processor;
pub mod rules;
pub mod windows;

pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "sf-stream-processor",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn ready() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ready" }))
}

pub async fn metrics_handler() -> impl axum::response::IntoResponse {
    use prometheus::{Encoder, TextEncoder};
    let encoder = TextEncoder::new();
    let families = metrics::REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
    }
    (
        [("content-type", encoder.format_type().to_string())],
        buffer,
    )
}
