pub mod config;
pub mod ingest;
pub mod metrics;
pub mod outbox_publisher;
pub mod routes;

use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "sf-ingestion",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn ready(axum::extract::State(state): axum::extract::State<AppState>) -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, axum::Json(serde_json::json!({"status": "ready"}))),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(serde_json::json!({"status": "not ready", "error": e.to_string()})),
        ),
    }
}
