//! The alert state machine instance model.
//!
//! ```text
//!               fire
//!   (none) ────────────► pending ── within suppress_window ──► suppressed (dropped)
//!                           │
//!                           │ deliver
//!                           ▼
//!                        active ──── ack ───► acknowledged
//!                           │                    │
//!           escalate_after  │                    │
//!                           ▼                    │
//!                       escalated                │
//!                           │                    │
//!                           └──── resolve ───► resolved (terminal)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Error => "error",
            AlertLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    Pending,
    Active,
    Suppressed,
    Escalated,
    Acknowledged,
    Resolved,
}

impl AlertState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AlertState::Resolved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertState::Pending => "pending",
            AlertState::Active => "active",
            AlertState::Suppressed => "suppressed",
            AlertState::Escalated => "escalated",
            AlertState::Acknowledged => "acknowledged",
            AlertState::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub rule_id: String,
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub state: AlertState,
    pub fired_at: DateTime<Utc>,
    #[serde(default)]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub escalated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub acknowledged_by: Option<String>,
    #[serde(default)]
    pub resolved_by: Option<String>,
}

impl Alert {
    pub fn new(rule_id: impl Into<String>, level: AlertLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            rule_id: rule_id.into(),
            level,
            title: title.into(),
            message: message.into(),
            data: serde_json::Value::Null,
            state: AlertState::Active,
            fired_at: Utc::now(),
            acknowledged_at: None,
            resolved_at: None,
            escalated_at: None,
            acknowledged_by: None,
            resolved_by: None,
        }
    }

    /// `acknowledged_at <= resolved_at` invariant.
    pub fn acknowledge(&mut self, actor: impl Into<String>, at: DateTime<Utc>) {
        self.state = AlertState::Acknowledged;
        self.acknowledged_at = Some(at);
        self.acknowledged_by = Some(actor.into());
    }

    /// Resolved alerts are terminal and never re-opened; a new alert is
    /// created instead.
    pub fn resolve(&mut self, actor: impl Into<String>, at: DateTime<Utc>) {
        self.state = AlertState::Resolved;
        self.resolved_at = Some(at);
        self.resolved_by = Some(actor.into());
    }

    pub fn escalate(&mut self, at: DateTime<Utc>) {
        self.state = AlertState::Escalated;
        self.escalated_at = Some(at);
    }

    pub fn is_escalation_eligible(&self, escalation_minutes: i64, now: DateTime<Utc>) -> bool {
        escalation_minutes > 0
            && self.escalated_at.is_none()
            && self.acknowledged_at.is_none()
            && self.resolved_at.is_none()
            && now >= self.fired_at + chrono::Duration::minutes(escalation_minutes)
    }
}
