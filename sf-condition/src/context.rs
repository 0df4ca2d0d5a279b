//! Everything a condition is allowed to read, bundled once per event.

use std::collections::{HashMap, HashSet};

/// Snapshot passed into evaluation — counts and metric values are copied
/// out of the stream processor's windows/registry before the condition
/// runs, so evaluation never holds a lock across a potentially
/// long-running rule chain.
#[derive(Debug, Clone, Default)]
pub struct RuleContext {
    pub event_type: String,
    pub severity: String,
    pub source: String,
    pub data: serde_json::Value,
    pub tags: HashSet<String>,
    pub windows: HashMap<String, usize>,
    pub metrics: HashMap<String, f64>,
}

impl RuleContext {
    pub fn new(event_type: impl Into<String>, severity: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            severity: severity.into(),
            source: source.into(),
            data: serde_json::Value::Null,
            tags: HashSet::new(),
            windows: HashMap::new(),
            metrics: HashMap::new(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_tags(mut self, tags: HashSet<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_window_count(mut self, name: impl Into<String>, count: usize) -> Self {
        self.windows.insert(name.into(), count);
        self
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }
}
