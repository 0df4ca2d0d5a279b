//! The event: the unit of input to the whole pipeline.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Maximum serialized size of `Event::data`, per spec.
pub const MAX_DATA_BYTES: usize = 100 * 1024;

/// Maximum number of tags on a single event.
pub const MAX_TAGS: usize = 10;

/// How far into the future a timestamp may drift before rejection.
pub const TIMESTAMP_SKEW: Duration = Duration::seconds(5);

/// Closed event-type enumeration with an open `custom` variant, per the
/// "enum with open case" design note: dispatch and metrics treat `custom`
/// as a single bucket, with the sub-tag preserved in `data.custom_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Web,
    Api,
    User,
    Error,
    Metric,
    Custom,
}

/// Full event type, e.g. `web.click`, `user.login`, `error`, `custom`.
/// Stored as `category.subtype` (subtype optional for bare categories like
/// `error`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventType {
    pub category: EventCategory,
    pub subtype: Option<String>,
}

impl EventType {
    pub fn new(category: EventCategory, subtype: impl Into<Option<String>>) -> Self {
        Self {
            category,
            subtype: subtype.into(),
        }
    }

    /// Dotted wire representation, e.g. `"user.login"` or `"error"`.
    pub fn as_wire_string(&self) -> String {
        let cat = match self.category {
            EventCategory::Web => "web",
            EventCategory::Api => "api",
            EventCategory::User => "user",
            EventCategory::Error => "error",
            EventCategory::Metric => "metric",
            EventCategory::Custom => "custom",
        };
        match &self.subtype {
            Some(sub) => format!("{cat}.{sub}"),
            None => cat.to_string(),
        }
    }

    pub fn parse(s: &str) -> Self {
        let (cat, sub) = match s.split_once('.') {
            Some((cat, sub)) => (cat, Some(sub.to_string())),
            None => (s, None),
        };
        let category = match cat {
            "web" => EventCategory::Web,
            "api" => EventCategory::Api,
            "user" => EventCategory::User,
            "error" => EventCategory::Error,
            "metric" => EventCategory::Metric,
            _ => EventCategory::Custom,
        };
        // Anything that doesn't map to a known category is folded into
        // `custom`, with the whole original string kept as the sub-tag so
        // no information is lost.
        if matches!(category, EventCategory::Custom) && cat != "custom" {
            return Self {
                category,
                subtype: Some(s.to_string()),
            };
        }
        Self {
            category,
            subtype: sub,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_wire_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EventSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSeverity::Low => "low",
            EventSeverity::Medium => "medium",
            EventSeverity::High => "high",
            EventSeverity::Critical => "critical",
        }
    }
}

/// The core event model. Immutable after publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub severity: EventSeverity,
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tags: HashSet<String>,
}

impl Event {
    /// Validate shape invariants: `data` is a JSON object within the size
    /// cap, `timestamp` is not (meaningfully) in the future, tags are
    /// bounded, and the type-specific requirements from the ingestion
    /// contract hold (`error`+`low` rejected, `user.login` needs a
    /// `user_id`).
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.data.is_object() {
            return Err(CoreError::Validation(
                "event data must be a JSON object".into(),
            ));
        }
        let size = serde_json::to_vec(&self.data)
            .map_err(|e| CoreError::Validation(format!("data not serializable: {e}")))?
            .len();
        if size > MAX_DATA_BYTES {
            return Err(CoreError::Validation(format!(
                "event data is {size} bytes, exceeds the {MAX_DATA_BYTES} byte cap"
            )));
        }
        if self.tags.len() > MAX_TAGS {
            return Err(CoreError::Validation(format!(
                "event has {} tags, exceeds the {MAX_TAGS} tag cap",
                self.tags.len()
            )));
        }
        if self.source.trim().is_empty() {
            return Err(CoreError::Validation("source is required".into()));
        }
        if self.timestamp > Utc::now() + TIMESTAMP_SKEW {
            return Err(CoreError::Validation(
                "timestamp cannot be in the future".into(),
            ));
        }
        if self.event_type.category == EventCategory::Error
            && self.severity == EventSeverity::Low
        {
            return Err(CoreError::Validation(
                "error events cannot carry low severity".into(),
            ));
        }
        if self.event_type.category == EventCategory::User
            && self.event_type.subtype.as_deref() == Some("login")
            && self.user_id.is_none()
        {
            return Err(CoreError::Validation(
                "user.login events require a user_id".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_event() -> Event {
        Event {
            id: Uuid::new_v4(),
            event_type: EventType::new(EventCategory::Web, "click".to_string()),
            source: "web-app".into(),
            timestamp: Utc::now(),
            severity: EventSeverity::Low,
            data: serde_json::json!({ "page": "/home" }),
            correlation_id: None,
            session_id: None,
            user_id: Some("u1".into()),
            tags: HashSet::new(),
        }
    }

    #[test]
    fn accepts_a_well_formed_event() {
        assert!(base_event().validate().is_ok());
    }

    #[test]
    fn rejects_non_object_data() {
        let mut ev = base_event();
        ev.data = serde_json::json!([1, 2, 3]);
        assert!(ev.validate().is_err());
    }

    #[test]
    fn rejects_oversized_data() {
        let mut ev = base_event();
        ev.data = serde_json::json!({ "blob": "x".repeat(MAX_DATA_BYTES + 1) });
        assert!(ev.validate().is_err());
    }

    #[test]
    fn rejects_low_severity_error() {
        let mut ev = base_event();
        ev.event_type = EventType::new(EventCategory::Error, None);
        ev.severity = EventSeverity::Low;
        assert!(ev.validate().is_err());
    }

    #[test]
    fn rejects_login_without_user_id() {
        let mut ev = base_event();
        ev.event_type = EventType::new(EventCategory::User, "login".to_string());
        ev.user_id = None;
        assert!(ev.validate().is_err());
    }

    #[test]
    fn rejects_future_timestamp() {
        let mut ev = base_event();
        ev.timestamp = Utc::now() + Duration::minutes(5);
        assert!(ev.validate().is_err());
    }

    #[test]
    fn custom_type_preserves_subtag() {
        let t = EventType::parse("payment.refunded");
        assert_eq!(t.category, EventCategory::Custom);
        assert_eq!(t.subtype.as_deref(), Some("payment.refunded"));
    }

    #[test]
    fn wire_roundtrip() {
        let t = EventType::new(EventCategory::User, "login".to_string());
        assert_eq!(EventType::parse(&t.as_wire_string()), t);
    }
}
