use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref ALERTS_FIRED: IntCounterVec = IntCounterVec::new(
        prometheus::opts!("alerts_fired_total", "alerts fired, by rule and level"),
        &["rule", "level"]
    )
    .unwrap();
    pub static ref ALERTS_SUPPRESSED: IntCounterVec = IntCounterVec::new(
        prometheus::opts!("alerts_suppressed_total", "alert firings dropped by the suppression window"),
        &["rule"]
    )
    .unwrap();
    pub static ref ALERTS_ESCALATED: IntCounterVec = IntCounterVec::new(
        prometheus::opts!("alerts_escalated_total", "alerts escalated by the lifecycle worker"),
        &["rule"]
    )
    .unwrap();
    pub static ref NOTIFICATIONS_FAILED: IntCounterVec = IntCounterVec::new(
        prometheus::opts!("notifications_failed_total", "notification sends that failed or timed out, by channel and reason"),
        &["channel", "reason"]
    )
    .unwrap();
}

pub fn register() {
    let _ = REGISTRY.register(Box::new(ALERTS_FIRED.clone()));
    let _ = REGISTRY.register(Box::new(ALERTS_SUPPRESSED.clone()));
    let _ = REGISTRY.register(Box::new(ALERTS_ESCALATED.clone()));
    let _ = REGISTRY.register(Box::new(NOTIFICATIONS_FAILED.clone()));
}
