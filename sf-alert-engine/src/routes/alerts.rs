//! `GET /api/v1/alerts`, `GET /api/v1/alerts/stats`, and the
//! acknowledge/resolve admin actions, per spec.md §6.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use sf_domain::response::ApiEnvelope;
use sf_domain::{Alert, CoreError};
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListAlertsQuery {
    pub status: Option<String>,
    pub hours: Option<i64>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<ListAlertsQuery>,
) -> Result<ApiEnvelope<Vec<Alert>>, CoreError> {
    let alerts = sf_store::alerts_repo::list(
        &state.pool,
        query.status.as_deref(),
        query.hours,
        query.limit,
    )
    .await?;
    Ok(ApiEnvelope::ok("alerts retrieved", alerts))
}

pub async fn alert_stats(
    State(state): State<AppState>,
) -> Result<ApiEnvelope<sf_store::alerts_repo::AlertStats>, CoreError> {
    let stats = sf_store::alerts_repo::stats(&state.pool).await?;
    Ok(ApiEnvelope::ok("alert stats retrieved", stats))
}

/// Actor identity for an admin action. Authentication is out of scope
/// (spec.md §1) — the caller names themselves, defaulting to `"api"` for
/// unauthenticated callers, same placeholder shape as the ingestion
/// websocket's synthetic user id.
#[derive(Debug, Default, Deserialize)]
pub struct ActorBody {
    #[serde(default)]
    pub actor: Option<String>,
}

fn actor_of(body: Option<Json<ActorBody>>) -> String {
    body.and_then(|b| b.0.actor).unwrap_or_else(|| "api".to_string())
}

pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ActorBody>>,
) -> Result<ApiEnvelope<Alert>, CoreError> {
    let actor = actor_of(body);
    let alert = sf_store::alerts_repo::acknowledge(&state.pool, id, &actor, chrono::Utc::now())
        .await?
        .ok_or_else(|| CoreError::Validation(format!("alert {id} not found or already resolved")))?;
    Ok(ApiEnvelope::ok("alert acknowledged", alert))
}

pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ActorBody>>,
) -> Result<ApiEnvelope<Alert>, CoreError> {
    let actor = actor_of(body);
    let alert = sf_store::alerts_repo::resolve(&state.pool, id, &actor, chrono::Utc::now())
        .await?
        .ok_or_else(|| CoreError::Validation(format!("alert {id} not found or already resolved")))?;
    Ok(ApiEnvelope::ok("alert resolved", alert))
}
