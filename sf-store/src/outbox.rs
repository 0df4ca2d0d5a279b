//! A generic transactional outbox, generalized from the teacher's
//! `subscriptions::outbox` + `subscriptions::publisher`: any service that
//! needs "commit to the database, publish later, never fail the caller on
//! a broker hiccup" enqueues here inside its own transaction and a
//! background drain loop does the publishing.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::error::StoreError;

#[derive(Debug, Clone, FromRow)]
pub struct OutboxRecord {
    pub id: i64,
    pub routing_key: String,
    pub payload: serde_json::Value,
    pub correlation_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Enqueue a row inside an already-open transaction, so the write is
/// atomic with whatever else the caller is committing.
pub async fn enqueue_tx(
    tx: &mut Transaction<'_, Postgres>,
    routing_key: &str,
    payload: &serde_json::Value,
    correlation_id: Option<&str>,
) -> Result<i64, StoreError> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO events_outbox (routing_key, payload, correlation_id)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(routing_key)
    .bind(payload)
    .bind(correlation_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row.0)
}

pub async fn fetch_unpublished(pool: &PgPool, limit: i64) -> Result<Vec<OutboxRecord>, StoreError> {
    let rows = sqlx::query_as::<_, OutboxRecord>(
        r#"
        SELECT id, routing_key, payload, correlation_id, created_at, published_at
        FROM events_outbox
        WHERE published_at IS NULL
        ORDER BY created_at ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn mark_published(pool: &PgPool, id: i64) -> Result<(), StoreError> {
    sqlx::query("UPDATE events_outbox SET published_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
