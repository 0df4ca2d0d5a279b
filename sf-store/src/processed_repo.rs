//! Idempotent-consume ledger, generalizing `gl::repos::processed_repo` and
//! `notifications::consumer::EventConsumer`'s `processed_events` table into
//! a per-consumer message key so any service can guard against re-delivery
//! firing a handler twice.

use sqlx::PgPool;

use crate::error::StoreError;

pub async fn is_processed(pool: &PgPool, consumer: &str, message_key: &str) -> Result<bool, StoreError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM processed_messages WHERE message_key = $1 AND consumer = $2)",
    )
    .bind(message_key)
    .bind(consumer)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Record `message_key` as processed. A concurrent duplicate insert is a
/// no-op, not an error.
pub async fn mark_processed(pool: &PgPool, consumer: &str, message_key: &str) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO processed_messages (message_key, consumer)
        VALUES ($1, $2)
        ON CONFLICT (message_key) DO NOTHING
        "#,
    )
    .bind(message_key)
    .bind(consumer)
    .execute(pool)
    .await?;
    Ok(())
}
