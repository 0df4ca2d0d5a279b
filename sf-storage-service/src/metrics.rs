//! The only metrics the storage service owns: events committed, events
//! duplicate-skipped, and rows deleted per retention sweep. Richer metrics
//! exposition belongs to the excluded outer layer (spec.md §1).

use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref EVENTS_STORED: IntCounter = IntCounter::new(
        "storage_events_stored_total",
        "events committed to the events table"
    )
    .unwrap();
    pub static ref RETENTION_DELETED: IntCounterVec = IntCounterVec::new(
        prometheus::opts!("storage_retention_deleted_total", "rows deleted by a retention sweep, by event type"),
        &["event_type"]
    )
    .unwrap();
}

pub fn register() {
    let _ = REGISTRY.register(Box::new(EVENTS_STORED.clone()));
    let _ = REGISTRY.register(Box::new(RETENTION_DELETED.clone()));
}
