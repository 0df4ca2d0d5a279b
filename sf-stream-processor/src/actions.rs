//! The action dispatch table: a fixed, closed set of named Rust
//! functions a matching rule's `action.name` resolves to. This is
//! emphatically not the forbidden "dynamic evaluation" spec.md §4.D
//! singles out — the predicate grammar is the one place that must avoid
//! arbitrary evaluation; dispatching to one of a handful of statically
//! known functions by name is the same shape as the original's small
//! registry of action callables, just without the ability to register an
//! arbitrary one at runtime.

use sf_condition::RuleContext;
use sf_domain::Rule;

/// What a rule action produced. `derived` is published onto
/// `analytics.<action_name>`; `alert` (when present) is published
/// directly onto `alerts.<rule_name>` for the alert engine's direct
/// queue.
#[derive(Debug, Clone, Default)]
pub struct ActionOutcome {
    pub derived: Option<serde_json::Value>,
    pub alert: Option<AlertTrigger>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AlertTrigger {
    pub rule_id: String,
    pub level: String,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

pub type ActionFn = fn(&Rule, &RuleContext) -> ActionOutcome;

pub fn lookup(action_name: &str) -> ActionFn {
    match action_name {
        "high_error_rate" => high_error_rate,
        "activity_spike" => activity_spike,
        _ => log_event,
    }
}

fn high_error_rate(rule: &Rule, ctx: &RuleContext) -> ActionOutcome {
    let count = rule
        .window
        .as_ref()
        .and_then(|w| ctx.windows.get(w))
        .copied()
        .unwrap_or(0);
    ActionOutcome {
        derived: Some(serde_json::json!({
            "rule": rule.name,
            "window": rule.window,
            "count": count,
            "source": ctx.source,
        })),
        alert: Some(AlertTrigger {
            rule_id: rule.name.clone(),
            level: rule.alert_level.clone().unwrap_or_else(|| "critical".into()),
            title: format!("high_error_rate: {count} errors in window"),
            message: format!(
                "{} errors observed in window '{}', exceeding the configured threshold",
                count,
                rule.window.as_deref().unwrap_or("1min")
            ),
            value: Some(count as f64),
            data: Some(ctx.data.clone()),
        }),
    }
}

fn activity_spike(rule: &Rule, ctx: &RuleContext) -> ActionOutcome {
    let count = rule
        .window
        .as_ref()
        .and_then(|w| ctx.windows.get(w))
        .copied()
        .unwrap_or(0);
    ActionOutcome {
        derived: Some(serde_json::json!({
            "rule": rule.name,
            "window": rule.window,
            "count": count,
            "source": ctx.source,
        })),
        alert: Some(AlertTrigger {
            rule_id: rule.name.clone(),
            level: rule.alert_level.clone().unwrap_or_else(|| "warning".into()),
            title: format!("activity_spike: {count} events in window"),
            message: format!(
                "{} login/logout events observed in window '{}'",
                count,
                rule.window.as_deref().unwrap_or("5min")
            ),
            value: Some(count as f64),
            data: Some(ctx.data.clone()),
        }),
    }
}

/// Default action for rules with no dedicated handler: a plain derived
/// record, no alert.
fn log_event(rule: &Rule, ctx: &RuleContext) -> ActionOutcome {
    ActionOutcome {
        derived: Some(serde_json::json!({
            "rule": rule.name,
            "event_type": ctx.event_type,
            "severity": ctx.severity,
            "source": ctx.source,
        })),
        alert: None,
    }
}
