//! The per-event pipeline: append to windows, evaluate rules, emit
//! metrics — in that strict order (spec.md §5: "window updates for event
//! E strictly precede rule evaluation for E, which strictly precedes
//! metric emission for E").

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use sf_condition::RuleContext;
use sf_domain::{Event, Metric, MetricType};
use sf_fabric::topology::{EXCHANGE_ALERTS, EXCHANGE_ANALYTICS};
use sf_fabric::Fabric;

use crate::actions;
use crate::metrics;
use crate::rules::RuleRegistry;
use crate::windows::WindowRegistry;

pub struct Processor {
    windows: WindowRegistry,
    rules: RuleRegistry,
    fabric: Arc<Fabric>,
    /// Last-observed value per metric name, so a condition referencing
    /// `metrics[<name>]` sees the most recent emission rather than
    /// nothing — the union context spec.md §9 adopts between the two
    /// source implementations' divergent field sets.
    last_metrics: RwLock<std::collections::HashMap<String, f64>>,
}

impl Processor {
    pub fn new(windows: WindowRegistry, rules: RuleRegistry, fabric: Arc<Fabric>) -> Self {
        Self {
            windows,
            rules,
            fabric,
            last_metrics: RwLock::new(std::collections::HashMap::new()),
        }
    }

    pub async fn process(&self, event: Event) {
        let now = Utc::now();

        // 1. Window append — strictly before rule evaluation.
        self.windows.append(&event);
        let window_counts = self.windows.snapshot_counts(now);

        let ctx = RuleContext {
            event_type: event.event_type.as_wire_string(),
            severity: event.severity.as_str().to_string(),
            source: event.source.clone(),
            data: event.data.clone(),
            tags: event.tags.clone(),
            windows: window_counts.clone(),
            metrics: self.last_metrics.read().clone(),
        };

        // 2. Rule evaluation — strictly before metric emission.
        let mut outcome = EventOutcome::Completed;
        self.rules.for_each_enabled(|rule, expr| {
            if sf_condition::eval_condition(expr, &ctx) {
                if let Err(panic) =
                    std::panic::catch_unwind(AssertUnwindSafe(|| self.run_action(rule, &ctx)))
                {
                    metrics::RULE_ACTIONS_FAILED
                        .with_label_values(&[rule.name.as_str()])
                        .inc();
                    tracing::error!(rule = %rule.name, ?panic, "rule action panicked, continuing with remaining rules");
                    outcome = EventOutcome::Failed;
                }
            }
        });

        // 3. Metric emission.
        self.emit_metrics(&event, &window_counts, now).await;

        tracing::debug!(event_id = %event.id, outcome = ?outcome, "event processed");
    }

    fn run_action(&self, rule: &sf_domain::Rule, ctx: &RuleContext) {
        let action_fn = actions::lookup(&rule.action.name);
        let result = action_fn(rule, ctx);

        if let Some(derived) = result.derived {
            let routing_key = format!("analytics.{}", rule.action.name);
            let fabric = self.fabric.clone();
            tokio::spawn(async move {
                let envelope = sf_domain::MessageEnvelope::new(routing_key.clone(), derived);
                if let Err(e) = fabric.publish(EXCHANGE_ANALYTICS, &routing_key, envelope).await {
                    tracing::warn!(routing_key, error = %e, "failed to publish derived record");
                }
            });
        }

        if let Some(alert) = result.alert {
            let routing_key = format!("alerts.{}", rule.name);
            let fabric = self.fabric.clone();
            let payload = serde_json::to_value(&alert).unwrap_or(serde_json::Value::Null);
            tokio::spawn(async move {
                let envelope = sf_domain::MessageEnvelope::new(routing_key.clone(), payload);
                if let Err(e) = fabric.publish(EXCHANGE_ALERTS, &routing_key, envelope).await {
                    tracing::warn!(routing_key, error = %e, "failed to publish alert trigger");
                }
            });
        }
    }

    async fn emit_metrics(
        &self,
        event: &Event,
        window_counts: &std::collections::HashMap<String, usize>,
        now: chrono::DateTime<Utc>,
    ) {
        let type_str = event.event_type.as_wire_string();
        metrics::EVENTS_TOTAL
            .with_label_values(&[event.source.as_str(), type_str.as_str()])
            .inc();
        metrics::EVENTS_BY_SEVERITY
            .with_label_values(&[event.severity.as_str()])
            .inc();
        let processing_secs = (now - event.timestamp).num_milliseconds().max(0) as f64 / 1000.0;
        metrics::EVENT_PROCESSING_TIME
            .with_label_values(&[event.source.as_str()])
            .observe(processing_secs);

        let mut emitted = vec![
            Metric::new("events_total", MetricType::Counter, 1.0)
                .with_tag("source", event.source.clone())
                .with_tag("type", type_str.clone()),
            Metric::new("events_by_severity", MetricType::Counter, 1.0)
                .with_tag("severity", event.severity.as_str()),
            Metric::new("event_processing_time", MetricType::Timer, processing_secs)
                .with_tag("source", event.source.clone()),
        ];

        {
            let mut last = self.last_metrics.write();
            for (name, count) in window_counts {
                let gauge_name = format!("window_{name}_count");
                metrics::WINDOW_COUNT.with_label_values(&[name.as_str()]).set(*count as f64);
                last.insert(gauge_name.clone(), *count as f64);
                emitted.push(
                    Metric::new(gauge_name, MetricType::Gauge, *count as f64).with_tag("window", name.clone()),
                );
            }
            last.insert("events_total".to_string(), metrics::EVENTS_TOTAL
                .with_label_values(&[event.source.as_str(), type_str.as_str()])
                .get() as f64);
        }

        for metric in emitted {
            let fabric = self.fabric.clone();
            let routing_key = "analytics.metrics".to_string();
            tokio::spawn(async move {
                let payload = serde_json::to_value(&metric).unwrap_or(serde_json::Value::Null);
                let envelope = sf_domain::MessageEnvelope::new(routing_key.clone(), payload);
                if let Err(e) = fabric.publish(EXCHANGE_ANALYTICS, &routing_key, envelope).await {
                    tracing::warn!(error = %e, "failed to publish metric");
                }
            });
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum EventOutcome {
    Completed,
    Failed,
}
