//! The alert engine's own rule set: conditions evaluated against the
//! analytics payloads published by the stream processor's action dispatch
//! (spec.md §4.E: "evaluates each alert rule's condition against the
//! analytics payload; on match, fires a new alert").
//!
//! Distinct from `sf-stream-processor::rules` — that registry's conditions
//! run against raw events; this one runs against already-derived analytics
//! records, so the default set below matches on the `rule` field those
//! derived records carry (see `sf-stream-processor::actions`).

use sf_condition::Expr;
use sf_domain::{Rule, RuleAction};

pub struct RegisteredRule {
    pub rule: Rule,
    pub condition: Expr,
}

pub struct RuleRegistry {
    rules: Vec<RegisteredRule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn register(&mut self, rule: Rule) -> Result<(), sf_condition::ConditionError> {
        let condition = sf_condition::parse(&rule.condition)?;
        self.rules.push(RegisteredRule { rule, condition });
        Ok(())
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.rule.name == name).map(|r| &r.rule)
    }

    pub fn matching(&self, ctx: &sf_condition::RuleContext) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|r| r.rule.enabled && sf_condition::eval_condition(&r.condition, ctx))
            .map(|r| &r.rule)
            .collect()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub fn default_alert_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "high_error_rate".to_string(),
            condition: "data.rule == 'high_error_rate'".to_string(),
            action: RuleAction {
                name: "high_error_rate".to_string(),
                channels: vec!["email".to_string(), "slack".to_string()],
            },
            threshold: None,
            window: None,
            enabled: true,
            alert_level: Some("critical".to_string()),
            suppression_minutes: 5,
            escalation_minutes: 15,
        },
        Rule {
            name: "activity_spike".to_string(),
            condition: "data.rule == 'activity_spike'".to_string(),
            action: RuleAction {
                name: "activity_spike".to_string(),
                channels: vec!["slack".to_string()],
            },
            threshold: None,
            window: None,
            enabled: true,
            alert_level: Some("warning".to_string()),
            suppression_minutes: 10,
            escalation_minutes: 0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn matches_analytics_payload_by_rule_field() {
        let mut registry = RuleRegistry::new();
        for rule in default_alert_rules() {
            registry.register(rule).unwrap();
        }
        let ctx = sf_condition::RuleContext {
            event_type: "analytics".into(),
            severity: String::new(),
            source: "api-gateway".into(),
            data: serde_json::json!({"rule": "high_error_rate", "count": 12}),
            tags: Default::default(),
            windows: HashMap::new(),
            metrics: HashMap::new(),
        };
        let matches = registry.matching(&ctx);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "high_error_rate");
    }
}
