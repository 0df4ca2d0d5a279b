//! The alert state machine's firing and transition operations. A fresh
//! alert always enters at `Active` (delivery happens synchronously with
//! firing in this pipeline, so `pending` collapses into the suppression
//! check itself: a suppressed firing never persists a row at all).

use chrono::Utc;
use sf_domain::{Alert, AlertLevel};
use sf_store::StoreError;
use sqlx::PgPool;

fn parse_level(s: &str) -> AlertLevel {
    match s {
        "warning" => AlertLevel::Warning,
        "error" => AlertLevel::Error,
        "critical" => AlertLevel::Critical,
        _ => AlertLevel::Info,
    }
}

/// Attempt to fire a new alert for `rule_id`. Returns `None` when the
/// firing is suppressed (an unresolved alert for the same rule fired
/// within `suppression_minutes`) — suppression is a policy decision, not
/// an error, so it is never an `Err`.
pub async fn fire(
    pool: &PgPool,
    rule_id: &str,
    level: &str,
    title: &str,
    message: &str,
    data: serde_json::Value,
    suppression_minutes: i64,
) -> Result<Option<Alert>, StoreError> {
    if suppression_minutes > 0 {
        let since = Utc::now() - chrono::Duration::minutes(suppression_minutes);
        let unresolved = sf_store::alerts_repo::unresolved_since(pool, rule_id, since).await?;
        if !unresolved.is_empty() {
            tracing::info!(rule_id, suppression_minutes, "alert suppressed: unresolved alert already active for this rule");
            return Ok(None);
        }
    }

    let mut alert = Alert::new(rule_id, parse_level(level), title, message);
    alert.data = data;
    sf_store::alerts_repo::insert(pool, &alert).await?;
    tracing::info!(alert_id = %alert.id, rule_id, level, "alert fired");
    Ok(Some(alert))
}
