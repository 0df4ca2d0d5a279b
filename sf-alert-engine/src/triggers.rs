//! Wire shape of a direct alert trigger on `alerts.*`, matching
//! `sf-stream-processor::actions::AlertTrigger`'s serialized fields
//! (spec.md §4.E: "direct alert messages, schema: rule_id, level, title,
//! message, value?, data?"). Kept as a local struct rather than a
//! cross-crate dependency so the alert engine only ever trusts the wire
//! contract, not the stream processor's internal types.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DirectTrigger {
    pub rule_id: String,
    pub level: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}
