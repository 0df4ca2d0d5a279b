//! The retention sweep: a periodic task, shaped like the teacher's outbox
//! publisher loop (`subscriptions::publisher::run_publisher`), that
//! deletes event rows past their per-type policy age in bounded batches
//! per type.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::StoreError;

#[derive(Debug, Clone, FromRow)]
struct PolicyRow {
    event_type: String,
    retention_days: i32,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SweepReport {
    pub deleted_by_type: Vec<(String, u64)>,
}

impl SweepReport {
    pub fn total_deleted(&self) -> u64 {
        self.deleted_by_type.iter().map(|(_, n)| n).sum()
    }
}

/// Run one retention sweep: for every policy row (including `default`),
/// delete events of that type whose `timestamp` is older than the policy
/// and whose `created_at` predates `sweep_start` — so rows ingested
/// mid-sweep are never caught by a sweep that started before they
/// existed, and unacknowledged alerts are never touched (this sweep never
/// reads the alerts table).
pub async fn run_sweep(pool: &PgPool, sweep_start: DateTime<Utc>) -> Result<SweepReport, StoreError> {
    let policies = sqlx::query_as::<_, PolicyRow>(
        "SELECT event_type, retention_days FROM retention_policies",
    )
    .fetch_all(pool)
    .await?;

    let default_days = policies
        .iter()
        .find(|p| p.event_type == "default")
        .map(|p| p.retention_days)
        .unwrap_or(90);

    let types_in_use: Vec<String> = sqlx::query_scalar("SELECT DISTINCT type FROM events")
        .fetch_all(pool)
        .await?;

    let mut report = SweepReport::default();

    for event_type in types_in_use {
        let retention_days = policies
            .iter()
            .find(|p| p.event_type == event_type)
            .map(|p| p.retention_days)
            .unwrap_or(default_days);
        let cutoff = sweep_start - chrono::Duration::days(retention_days as i64);

        let result = sqlx::query(
            r#"
            DELETE FROM events
            WHERE type = $1 AND timestamp < $2 AND created_at < $3
            "#,
        )
        .bind(&event_type)
        .bind(cutoff)
        .bind(sweep_start)
        .execute(pool)
        .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            tracing::info!(event_type = %event_type, deleted, retention_days, "retention sweep deleted rows");
        }
        report.deleted_by_type.push((event_type, deleted));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_report_totals() {
        let report = SweepReport {
            deleted_by_type: vec![("web.click".into(), 3), ("error".into(), 2)],
        };
        assert_eq!(report.total_deleted(), 5);
    }
}
