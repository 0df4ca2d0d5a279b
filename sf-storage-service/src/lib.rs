//! Storage service: consumes `storage.events`, commits every event to the
//! durable store, and serves the query/stats/backup/cleanup surface from
//! spec.md §4.F/§6.

pub mod config;
pub mod consumer;
pub mod metrics;
pub mod retention_worker;
pub mod routes;

use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "sf-storage-service",
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
