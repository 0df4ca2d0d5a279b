//! The rule registry: hot-loadable detectors, each pre-parsed into a
//! condition AST at registration time so an unknown identifier is
//! rejected before the rule can ever run (spec.md §4.D).

use parking_lot::RwLock;
use sf_condition::Expr;
use sf_domain::{Rule, RuleAction, WindowSpec};

pub struct RegisteredRule {
    pub rule: Rule,
    pub condition: Expr,
}

pub struct RuleRegistry {
    rules: RwLock<Vec<RegisteredRule>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleRegistrationError {
    #[error("rule '{name}' has an invalid condition: {source}")]
    InvalidCondition {
        name: String,
        #[source]
        source: sf_condition::ConditionError,
    },
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
        }
    }

    /// Parse and register a rule. Rejects the rule outright — it is
    /// never added — if its condition references an unknown identifier.
    pub fn register(&self, rule: Rule) -> Result<(), RuleRegistrationError> {
        let condition =
            sf_condition::parse(&rule.condition).map_err(|source| RuleRegistrationError::InvalidCondition {
                name: rule.name.clone(),
                source,
            })?;
        self.rules.write().push(RegisteredRule { rule, condition });
        Ok(())
    }

    /// Per-rule enable/disable is a flag flip, not removal (spec.md §3).
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut rules = self.rules.write();
        if let Some(entry) = rules.iter_mut().find(|r| r.rule.name == name) {
            entry.rule.enabled = enabled;
            true
        } else {
            false
        }
    }

    pub fn for_each_enabled(&self, mut f: impl FnMut(&Rule, &Expr)) {
        for entry in self.rules.read().iter() {
            if entry.rule.enabled {
                f(&entry.rule, &entry.condition);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The two built-in rules spec.md §4.D requires, plus the default window
/// set they reference.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "high_error_rate".to_string(),
            condition: format!(
                "event_type == 'error' and windows['{}'].count() > 10",
                WindowSpec::DEFAULT_1MIN
            ),
            action: RuleAction::new("high_error_rate"),
            threshold: Some(10.0),
            window: Some(WindowSpec::DEFAULT_1MIN.to_string()),
            enabled: true,
            alert_level: Some("critical".to_string()),
            suppression_minutes: 5,
            escalation_minutes: 15,
        },
        Rule {
            name: "activity_spike".to_string(),
            condition: format!(
                "event_type in ['user.login', 'user.logout'] and windows['{}'].count() > 100",
                WindowSpec::DEFAULT_5MIN
            ),
            action: RuleAction::new("activity_spike"),
            threshold: Some(100.0),
            window: Some(WindowSpec::DEFAULT_5MIN.to_string()),
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

    #[test]
    fn registers_default_rules() {
        let registry = RuleRegistry::new();
        for rule in default_rules() {
            registry.register(rule).unwrap();
        }
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn rejects_unknown_identifier_at_registration() {
        let registry = RuleRegistry::new();
        let bad = Rule {
            name: "bogus".into(),
            condition: "nonsense_field == 1".into(),
            action: RuleAction::new("log_event"),
            threshold: None,
            window: None,
            enabled: true,
            alert_level: None,
            suppression_minutes: 0,
            escalation_minutes: 0,
        };
        assert!(registry.register(bad).is_err());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn disabling_a_rule_keeps_it_registered() {
        let registry = RuleRegistry::new();
        registry.register(default_rules().remove(0)).unwrap();
        assert!(registry.set_enabled("high_error_rate", false));
        assert_eq!(registry.len(), 1);
        let mut seen = 0;
        registry.for_each_enabled(|_, _| seen += 1);
        assert_eq!(seen, 0);
    }
}
