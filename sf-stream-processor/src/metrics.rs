//! The derived metrics spec.md §4.D names explicitly: event counts by
//! source/type/severity, processing-time observations, and per-window
//! gauges. Registered once per process, mirroring the teacher's
//! `prometheus` + `lazy_static` registry pattern (`notifications`'s
//! dependency stack), and also republished as [`sf_domain::Metric`]
//! records onto `analytics.metrics` for downstream consumers that read
//! the broker rather than `/metrics`.

use lazy_static::lazy_static;
use prometheus::{GaugeVec, HistogramVec, IntCounterVec, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref EVENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::opts!("events_total", "events processed by the stream processor"),
        &["source", "type"]
    )
    .unwrap();
    pub static ref EVENTS_BY_SEVERITY: IntCounterVec = IntCounterVec::new(
        prometheus::opts!("events_by_severity", "events processed, by severity"),
        &["severity"]
    )
    .unwrap();
    pub static ref EVENT_PROCESSING_TIME: HistogramVec = HistogramVec::new(
        prometheus::histogram_opts!(
            "event_processing_time",
            "seconds between event timestamp and processing"
        ),
        &["source"]
    )
    .unwrap();
    pub static ref WINDOW_COUNT: GaugeVec = GaugeVec::new(
        prometheus::opts!("window_count", "current count of events in a named window"),
        &["window"]
    )
    .unwrap();
    pub static ref RULE_ACTIONS_FAILED: IntCounterVec = IntCounterVec::new(
        prometheus::opts!("rule_actions_failed_total", "rule actions that panicked or errored"),
        &["rule"]
    )
    .unwrap();
}

pub fn register() {
    let _ = REGISTRY.register(Box::new(EVENTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(EVENTS_BY_SEVERITY.clone()));
    let _ = REGISTRY.register(Box::new(EVENT_PROCESSING_TIME.clone()));
    let _ = REGISTRY.register(Box::new(WINDOW_COUNT.clone()));
    let _ = REGISTRY.register(Box::new(RULE_ACTIONS_FAILED.clone()));
}
