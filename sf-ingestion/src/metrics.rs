//! The only metrics the ingestion edge owns: how many submissions were
//! accepted/rejected and how many background publishes failed. Richer
//! metrics exposition belongs to the excluded outer layer (spec.md §1).

use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref EVENTS_ACCEPTED: IntCounterVec = IntCounterVec::new(
        prometheus::opts!("ingestion_events_accepted_total", "events accepted at the ingestion edge"),
        &["source", "type"]
    )
    .unwrap();
    pub static ref EVENTS_REJECTED: IntCounterVec = IntCounterVec::new(
        prometheus::opts!("ingestion_events_rejected_total", "events rejected at the ingestion edge"),
        &["reason"]
    )
    .unwrap();
    pub static ref PUBLISH_FAILURES: IntCounterVec = IntCounterVec::new(
        prometheus::opts!("ingestion_publish_failures_total", "background outbox publishes that failed"),
        &["routing_key"]
    )
    .unwrap();
}

pub fn register() {
    let _ = REGISTRY.register(Box::new(EVENTS_ACCEPTED.clone()));
    let _ = REGISTRY.register(Box::new(EVENTS_REJECTED.clone()));
    let _ = REGISTRY.register(Box::new(PUBLISH_FAILURES.clone()));
}
