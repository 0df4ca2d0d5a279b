//! `GET /api/v1/analytics/{event-trends|user-distribution|top-sources|event-types}`,
//! per spec.md §4.G/§6.

use axum::extract::{Query, State};
use serde::Deserialize;
use sf_domain::response::ApiEnvelope;
use sf_domain::CoreError;

use crate::analytics::{
    event_trends, event_type_distribution, top_sources, user_distribution, EventTrendBucket,
    EventTypeDistributionEntry, TopSource, UserDistributionEntry,
};
use crate::{metrics, AppState};

#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    #[serde(default = "default_hours")]
    pub hours: i64,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: i64,
}

fn default_hours() -> i64 {
    24
}

fn default_interval_minutes() -> i64 {
    60
}

pub async fn get_event_trends(
    State(state): State<AppState>,
    Query(params): Query<TrendsQuery>,
) -> Result<ApiEnvelope<Vec<EventTrendBucket>>, CoreError> {
    metrics::QUERIES_SERVED.with_label_values(&["event-trends"]).inc();
    let trends = event_trends(&state.pool, params.hours, params.interval_minutes).await?;
    Ok(ApiEnvelope::ok("event trends retrieved", trends))
}

pub async fn get_user_distribution(
    State(state): State<AppState>,
) -> Result<ApiEnvelope<Vec<UserDistributionEntry>>, CoreError> {
    metrics::QUERIES_SERVED.with_label_values(&["user-distribution"]).inc();
    let distribution = user_distribution(&state.pool).await?;
    Ok(ApiEnvelope::ok("user distribution retrieved", distribution))
}

#[derive(Debug, Deserialize)]
pub struct TopSourcesQuery {
    #[serde(default = "default_top_sources_limit")]
    pub limit: i64,
}

fn default_top_sources_limit() -> i64 {
    10
}

pub async fn get_top_sources(
    State(state): State<AppState>,
    Query(params): Query<TopSourcesQuery>,
) -> Result<ApiEnvelope<Vec<TopSource>>, CoreError> {
    metrics::QUERIES_SERVED.with_label_values(&["top-sources"]).inc();
    let sources = top_sources(&state.pool, params.limit).await?;
    Ok(ApiEnvelope::ok("top sources retrieved", sources))
}

pub async fn get_event_types(
    State(state): State<AppState>,
) -> Result<ApiEnvelope<Vec<EventTypeDistributionEntry>>, CoreError> {
    metrics::QUERIES_SERVED.with_label_values(&["event-types"]).inc();
    let distribution = event_type_distribution(&state.pool).await?;
    Ok(ApiEnvelope::ok("event type distribution retrieved", distribution))
}
