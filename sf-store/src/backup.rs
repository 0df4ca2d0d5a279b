//! Backup export: a single bounded scan of the events table streamed out
//! as a JSON array, per spec.md §4.F. Synchronous from the caller's point
//! of view and not snapshot-isolated — the underlying store offers no
//! cheaper guarantee, which the spec explicitly allows.

use futures::TryStreamExt;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::events_repo::EventRow;

#[derive(Debug, Clone, Serialize)]
pub struct EventBackupRow {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub severity: String,
    pub data: serde_json::Value,
    pub correlation_id: Option<String>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub tags: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<EventRow> for EventBackupRow {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id.to_string(),
            event_type: row.event_type,
            source: row.source,
            timestamp: row.timestamp,
            severity: row.severity,
            data: row.data,
            correlation_id: row.correlation_id,
            session_id: row.session_id,
            user_id: row.user_id,
            tags: row.tags,
            created_at: row.created_at,
        }
    }
}

/// Export the full events table to a `Vec` of row records, ready to be
/// serialized as a JSON array.
pub async fn export_events(pool: &PgPool) -> Result<Vec<EventBackupRow>, StoreError> {
    let mut stream = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, type, source, timestamp, severity, data, event_metadata,
               correlation_id, session_id, user_id, tags, created_at
        FROM events
        ORDER BY created_at ASC
        "#,
    )
    .fetch(pool);

    let mut rows = Vec::new();
    while let Some(row) = stream.try_next().await? {
        rows.push(EventBackupRow::from(row));
    }
    Ok(rows)
}
