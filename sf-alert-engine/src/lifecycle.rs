//! The escalation lifecycle worker: wakes at least once a minute, scans
//! active/unacknowledged alerts, and escalates any whose `fired_at` is old
//! enough per its rule's `escalation_minutes` — recomputed from the
//! persisted row on every tick, including right after a restart
//! (spec.md §9's "source" fix: escalation eligibility must never depend on
//! in-memory timers that vanish on crash).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sf_domain::{Alert, AlertLevel};
use tokio::sync::watch;

use crate::consumer::AlertEngine;
use crate::metrics;

const TICK_INTERVAL: Duration = Duration::from_secs(30);

pub async fn run(engine: Arc<AlertEngine>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = tick(&engine).await {
                    tracing::error!(error = %e, "escalation lifecycle tick failed");
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::info!("escalation lifecycle worker shutting down");
                    return;
                }
            }
        }
    }
}

async fn tick(engine: &AlertEngine) -> Result<(), sf_store::StoreError> {
    let now = Utc::now();
    let candidates = sf_store::alerts_repo::active_unacknowledged(&engine.pool).await?;

    for alert in candidates {
        let escalation_minutes = engine
            .registry
            .find_by_name(&alert.rule_id)
            .map(|r| r.escalation_minutes)
            .unwrap_or(0);

        if !alert.is_escalation_eligible(escalation_minutes, now) {
            continue;
        }

        if !sf_store::alerts_repo::mark_escalated(&engine.pool, alert.id, now).await? {
            continue;
        }

        let clone = escalate_clone(&alert, now);
        sf_store::alerts_repo::insert(&engine.pool, &clone).await?;
        metrics::ALERTS_ESCALATED.with_label_values(&[&alert.rule_id]).inc();
        tracing::warn!(original_alert_id = %alert.id, escalated_alert_id = %clone.id, rule_id = %alert.rule_id, "alert escalated");

        let configured_channels = engine
            .registry
            .find_by_name(&alert.rule_id)
            .map(|r| r.action.channels.clone())
            .unwrap_or_default();
        crate::channels::dispatch(&engine.channels, &configured_channels, &clone).await;
    }

    Ok(())
}

fn escalate_clone(original: &Alert, at: chrono::DateTime<Utc>) -> Alert {
    let mut clone = Alert::new(
        original.rule_id.clone(),
        AlertLevel::Critical,
        format!("ESCALATED: {}", original.title),
        original.message.clone(),
    );
    clone.data = original.data.clone();
    clone.fired_at = at;
    clone
}
