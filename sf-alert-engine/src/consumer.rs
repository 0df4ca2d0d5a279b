//! Consumers for the two queues spec.md §4.E names: `alerting.analytics`
//! (evaluate alert rule conditions against analytics payloads) and
//! `alerting.direct` (fire an already-decided alert trigger directly).
//! Both paths are idempotent-consume, generalizing
//! `notifications::consumer::EventConsumer` onto `sf_store::processed_repo`.

use std::collections::HashMap;
use std::sync::Arc;

use sf_domain::MessageEnvelope;
use sqlx::PgPool;

use crate::channels::{self, NotificationChannel};
use crate::metrics;
use crate::rules::RuleRegistry;
use crate::state_machine;
use crate::triggers::DirectTrigger;

const CONSUMER_ANALYTICS: &str = "alert-engine.analytics";
const CONSUMER_DIRECT: &str = "alert-engine.direct";

pub struct AlertEngine {
    pub pool: PgPool,
    pub registry: RuleRegistry,
    pub channels: Vec<Box<dyn NotificationChannel>>,
}

impl AlertEngine {
    pub async fn handle_analytics(&self, envelope: MessageEnvelope) -> Result<(), String> {
        let message_key = envelope.id.to_string();
        if sf_store::processed_repo::is_processed(&self.pool, CONSUMER_ANALYTICS, &message_key)
            .await
            .map_err(|e| e.to_string())?
        {
            tracing::debug!(message_key, "analytics message already processed, skipping");
            return Ok(());
        }

        let source = envelope
            .payload
            .get("source")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let ctx = sf_condition::RuleContext {
            event_type: "analytics".to_string(),
            severity: String::new(),
            source,
            data: envelope.payload.clone(),
            tags: Default::default(),
            windows: HashMap::new(),
            metrics: HashMap::new(),
        };

        for rule in self.registry.matching(&ctx) {
            let level = rule.alert_level.as_deref().unwrap_or("info");
            let title = format!("{}: analytics condition matched", rule.name);
            let message = format!("analytics payload matched rule '{}'", rule.name);
            match state_machine::fire(
                &self.pool,
                &rule.name,
                level,
                &title,
                &message,
                envelope.payload.clone(),
                rule.suppression_minutes,
            )
            .await
            {
                Ok(Some(alert)) => {
                    metrics::ALERTS_FIRED.with_label_values(&[&rule.name, level]).inc();
                    channels::dispatch(&self.channels, &rule.action.channels, &alert).await;
                }
                Ok(None) => {
                    metrics::ALERTS_SUPPRESSED.with_label_values(&[&rule.name]).inc();
                }
                Err(e) => {
                    tracing::error!(rule = %rule.name, error = %e, "failed to fire alert from analytics payload");
                    return Err(e.to_string());
                }
            }
        }

        sf_store::processed_repo::mark_processed(&self.pool, CONSUMER_ANALYTICS, &message_key)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub async fn handle_direct(&self, envelope: MessageEnvelope) -> Result<(), String> {
        let message_key = envelope.id.to_string();
        if sf_store::processed_repo::is_processed(&self.pool, CONSUMER_DIRECT, &message_key)
            .await
            .map_err(|e| e.to_string())?
        {
            tracing::debug!(message_key, "direct trigger already processed, skipping");
            return Ok(());
        }

        let trigger: DirectTrigger =
            serde_json::from_value(envelope.payload.clone()).map_err(|e| format!("malformed alert trigger: {e}"))?;

        let (suppression_minutes, configured_channels) = match self.registry.find_by_name(&trigger.rule_id) {
            Some(rule) => (rule.suppression_minutes, rule.action.channels.clone()),
            None => (0, vec!["email".to_string()]),
        };

        match state_machine::fire(
            &self.pool,
            &trigger.rule_id,
            &trigger.level,
            &trigger.title,
            &trigger.message,
            trigger.data.unwrap_or(serde_json::Value::Null),
            suppression_minutes,
        )
        .await
        {
            Ok(Some(alert)) => {
                metrics::ALERTS_FIRED.with_label_values(&[&trigger.rule_id, &trigger.level]).inc();
                channels::dispatch(&self.channels, &configured_channels, &alert).await;
            }
            Ok(None) => {
                metrics::ALERTS_SUPPRESSED.with_label_values(&[&trigger.rule_id]).inc();
            }
            Err(e) => {
                tracing::error!(rule_id = %trigger.rule_id, error = %e, "failed to fire direct alert trigger");
                return Err(e.to_string());
            }
        }

        sf_store::processed_repo::mark_processed(&self.pool, CONSUMER_DIRECT, &message_key)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

pub fn make_default_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    for rule in crate::rules::default_alert_rules() {
        registry
            .register(rule)
            .expect("built-in alert rule failed to register");
    }
    registry
}

pub fn default_channels(config: &crate::config::Config) -> Vec<Box<dyn NotificationChannel>> {
    vec![
        Box::new(crate::channels::EmailChannel::new(config.email_from.clone())),
        Box::new(crate::channels::SlackChannel::new(config.slack_webhook_url.clone())),
        Box::new(crate::channels::WebhookChannel::new(config.webhook_url.clone())),
    ]
}

pub type SharedEngine = Arc<AlertEngine>;
