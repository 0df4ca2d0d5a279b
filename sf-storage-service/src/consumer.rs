//! The `storage.events` consumer: deserialize the envelope payload into an
//! [`sf_domain::Event`] and commit it to the events table. Insertion is
//! idempotent by id (`ON CONFLICT (id) DO NOTHING` in
//! `sf_store::events_repo::insert_event`), so no separate dedup ledger is
//! needed here — redelivery of the same event id is already a no-op at
//! the repository layer, per spec.md §4.F.

use sf_domain::{Event, MessageEnvelope};
use sqlx::PgPool;

use crate::metrics;

pub async fn handle_event(pool: &PgPool, envelope: MessageEnvelope) -> Result<(), String> {
    let event: Event = serde_json::from_value(envelope.payload)
        .map_err(|e| format!("malformed event payload: {e}"))?;

    sf_store::events_repo::insert_event(pool, &event)
        .await
        .map_err(|e| e.to_string())?;

    metrics::EVENTS_STORED.inc();
    tracing::debug!(event_id = %event.id, "event committed to store");
    Ok(())
}
