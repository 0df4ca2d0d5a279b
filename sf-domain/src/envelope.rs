//! The broker payload wrapper. This is the platform-wide event contract:
//! one envelope shape for everything that crosses `sf-fabric`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub routing_key: String,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    pub timestamp: DateTime<Utc>,
}

impl MessageEnvelope {
    pub fn new(routing_key: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            routing_key: routing_key.into(),
            payload,
            headers: std::collections::HashMap::new(),
            correlation_id: None,
            expiration_ms: None,
            priority: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Option<String>) -> Self {
        self.correlation_id = correlation_id;
        self
    }
}
