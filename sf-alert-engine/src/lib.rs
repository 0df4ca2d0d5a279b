//! Alert engine: consumes `analytics.*` and `alerts.*`, drives the alert
//! state machine, fans notifications out to pluggable channels, and
//! serves the alert HTTP surface from spec.md §4.E/§6.

pub mod channels;
pub mod config;
pub mod consumer;
pub mod lifecycle;
pub mod metrics;
pub mod routes;
pub mod rules;
pub mod state_machine;
pub mod triggers;

use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "sf-alert-engine",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn ready(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, axum::Json(serde_json::json!({"status": "ready"}))),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(serde_json::json!({"status": "not ready", "error": e.to_string()})),
        ),
    }
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
