//! `GET /events/{id}`, `POST /api/v1/events/query`, and `GET /api/v1/stats`,
//! per spec.md §4.F and §6.

use axum::extract::{Path, State};
use axum::Json;
use sf_domain::response::ApiEnvelope;
use sf_domain::{CoreError, Event};
use sf_store::events_repo::{EventQueryFilter, EventStats};
use uuid::Uuid;

use crate::AppState;

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiEnvelope<Event>, CoreError> {
    let event = sf_store::events_repo::get_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::Validation(format!("event {id} not found")))?;
    Ok(ApiEnvelope::ok("event retrieved", event))
}

pub async fn query_events(
    State(state): State<AppState>,
    Json(filter): Json<EventQueryFilter>,
) -> Result<ApiEnvelope<Vec<Event>>, CoreError> {
    let events = sf_store::events_repo::query_events(&state.pool, &filter).await?;
    Ok(ApiEnvelope::ok("events retrieved", events))
}

pub async fn stats(State(state): State<AppState>) -> Result<ApiEnvelope<EventStats>, CoreError> {
    let stats = sf_store::events_repo::stats(&state.pool).await?;
    Ok(ApiEnvelope::ok("storage stats retrieved", stats))
}
