//! The single contract every submission path (single, batch, websocket)
//! goes through: validate, stamp identity, enqueue to the outbox inside
//! one transaction. Per spec.md §4.C.

use chrono::Utc;
use serde::Deserialize;
use sf_domain::{CoreError, Event};
use sqlx::PgPool;
use uuid::Uuid;

use crate::metrics;

/// The wire shape producers submit: everything `Event` has except the
/// server-stamped fields.
#[derive(Debug, Clone, Deserialize)]
pub struct EventSubmission {
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    #[serde(default)]
    pub timestamp: Option<chrono::DateTime<Utc>>,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default = "default_data")]
    pub data: serde_json::Value,
    #[serde(default)]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_severity() -> String {
    "low".to_string()
}

fn default_data() -> serde_json::Value {
    serde_json::json!({})
}

fn parse_severity(s: &str) -> sf_domain::EventSeverity {
    use sf_domain::EventSeverity::*;
    match s {
        "medium" => Medium,
        "high" => High,
        "critical" => Critical,
        _ => Low,
    }
}

/// Stamp `id`, `timestamp` (if absent), and `user_id` (fallback to the
/// caller identity the transport layer supplies — `None` for unauthenticated
/// callers per the trust-boundary note in spec.md §9), then validate shape.
pub fn stamp_and_validate(
    submission: EventSubmission,
    caller_identity: Option<&str>,
) -> Result<Event, CoreError> {
    let event = Event {
        id: Uuid::new_v4(),
        event_type: sf_domain::EventType::parse(&submission.event_type),
        source: submission.source,
        timestamp: submission.timestamp.unwrap_or_else(Utc::now),
        severity: parse_severity(&submission.severity),
        data: submission.data,
        correlation_id: submission.correlation_id,
        session_id: submission.session_id,
        user_id: submission
            .user_id
            .or_else(|| caller_identity.map(String::from)),
        tags: submission.tags.into_iter().collect(),
    };
    event.validate()?;
    Ok(event)
}

/// Enqueue a validated event to the outbox inside one transaction and
/// return its assigned id. The background publisher drains it onto
/// `events.<type>` afterward; failure of that later publish never
/// unwinds this call.
pub async fn enqueue(pool: &PgPool, event: &Event) -> Result<Uuid, CoreError> {
    let routing_key = format!("events.{}", event.event_type.as_wire_string());
    let payload =
        serde_json::to_value(event).map_err(|e| CoreError::Validation(e.to_string()))?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| CoreError::Transient(e.to_string()))?;
    sf_store::outbox::enqueue_tx(&mut tx, &routing_key, &payload, event.correlation_id.as_deref())
        .await
        .map_err(|e| CoreError::Transient(e.to_string()))?;
    tx.commit()
        .await
        .map_err(|e| CoreError::Transient(e.to_string()))?;

    metrics::EVENTS_ACCEPTED
        .with_label_values(&[&event.source, &event.event_type.as_wire_string()])
        .inc();
    Ok(event.id)
}
