//! Declarative detector model: windows and rules. The condition grammar
//! itself lives in `sf-condition`; this crate only carries the
//! configuration shape so both the stream processor and the alert engine
//! can share one `Rule` type.

use serde::{Deserialize, Serialize};

/// A named sliding time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSpec {
    pub name: String,
    /// Window size in seconds.
    pub size_secs: i64,
    /// Slide interval in seconds; defaults to `size_secs`.
    #[serde(default)]
    pub slide_secs: Option<i64>,
}

impl WindowSpec {
    pub fn new(name: impl Into<String>, size_secs: i64) -> Self {
        Self {
            name: name.into(),
            size_secs,
            slide_secs: None,
        }
    }

    pub fn slide(&self) -> i64 {
        self.slide_secs.unwrap_or(self.size_secs)
    }

    /// A window whose `size < slide` is rejected at registration.
    pub fn validate(&self) -> Result<(), String> {
        if self.size_secs <= 0 {
            return Err("window size must be positive".into());
        }
        if self.slide() > self.size_secs {
            return Err(format!(
                "window '{}' has slide {} > size {}",
                self.name,
                self.slide(),
                self.size_secs
            ));
        }
        Ok(())
    }

    pub const DEFAULT_1MIN: &'static str = "1min";
    pub const DEFAULT_5MIN: &'static str = "5min";
    pub const DEFAULT_1HOUR: &'static str = "1hour";

    /// The default window set the stream processor registers at startup.
    pub fn defaults() -> Vec<WindowSpec> {
        vec![
            WindowSpec::new(Self::DEFAULT_1MIN, 60),
            WindowSpec::new(Self::DEFAULT_5MIN, 300),
            WindowSpec::new(Self::DEFAULT_1HOUR, 3600),
        ]
    }
}

/// What a matching rule does. Stream-processor rules publish a derived
/// record; alert rules additionally carry notification channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleAction {
    pub name: String,
    #[serde(default)]
    pub channels: Vec<String>,
}

impl RuleAction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: Vec::new(),
        }
    }
}

/// A declarative detector: a name, a predicate, an action, and the
/// thresholds/windows it refers to. Rules are hot-loadable; `enabled` is a
/// per-rule flag rather than removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub condition: String,
    pub action: RuleAction,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub window: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Severity assigned to alerts this rule fires, when it fires one.
    #[serde(default)]
    pub alert_level: Option<String>,
    /// Minutes after firing during which re-firings of the same rule are
    /// dropped. `0` disables suppression.
    #[serde(default)]
    pub suppression_minutes: i64,
    /// Minutes an unacknowledged alert waits before being escalated.
    /// `0` disables escalation.
    #[serde(default)]
    pub escalation_minutes: i64,
}

fn default_enabled() -> bool {
    true
}
