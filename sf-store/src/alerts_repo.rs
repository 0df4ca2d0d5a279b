//! Alert persistence: the alert rows backing the state machine in
//! `sf-domain::Alert`, plus the list/stats queries the alert HTTP surface
//! and the escalation lifecycle worker need.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sf_domain::{Alert, AlertLevel, AlertState};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Debug, Clone, FromRow)]
pub struct AlertRow {
    pub id: Uuid,
    pub rule_id: String,
    pub level: String,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub state: String,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
    pub escalated_at: Option<DateTime<Utc>>,
    pub data: serde_json::Value,
}

impl AlertRow {
    pub fn into_alert(self) -> Alert {
        Alert {
            id: self.id,
            rule_id: self.rule_id,
            level: parse_level(&self.level),
            title: self.title,
            message: self.message,
            data: self.data,
            state: parse_state(&self.state),
            fired_at: self.timestamp,
            acknowledged_at: self.acknowledged_at,
            resolved_at: self.resolved_at,
            escalated_at: self.escalated_at,
            acknowledged_by: self.acknowledged_by,
            resolved_by: self.resolved_by,
        }
    }
}

fn parse_level(s: &str) -> AlertLevel {
    match s {
        "warning" => AlertLevel::Warning,
        "error" => AlertLevel::Error,
        "critical" => AlertLevel::Critical,
        _ => AlertLevel::Info,
    }
}

fn parse_state(s: &str) -> AlertState {
    match s {
        "active" => AlertState::Active,
        "suppressed" => AlertState::Suppressed,
        "escalated" => AlertState::Escalated,
        "acknowledged" => AlertState::Acknowledged,
        "resolved" => AlertState::Resolved,
        _ => AlertState::Pending,
    }
}

pub async fn insert(pool: &PgPool, alert: &Alert) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO alerts
            (id, rule_id, level, title, message, timestamp, state, data)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(alert.id)
    .bind(&alert.rule_id)
    .bind(alert.level.as_str())
    .bind(&alert.title)
    .bind(&alert.message)
    .bind(alert.fired_at)
    .bind(alert.state.as_str())
    .bind(&alert.data)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Alert>, StoreError> {
    let row = sqlx::query_as::<_, AlertRow>(
        r#"
        SELECT id, rule_id, level, title, message, timestamp, state, resolved,
               resolved_at, resolved_by, acknowledged, acknowledged_at,
               acknowledged_by, escalated_at, data
        FROM alerts WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(AlertRow::into_alert))
}

/// List alerts, optionally filtered by `status` and bounded by `hours`
/// (fired within the last N hours) and `limit`, newest-first — the shape
/// `GET /api/v1/alerts?status=&limit=&hours=` needs.
pub async fn list(
    pool: &PgPool,
    status: Option<&str>,
    hours: Option<i64>,
    limit: i64,
) -> Result<Vec<Alert>, StoreError> {
    let mut qb = sqlx::QueryBuilder::new(
        "SELECT id, rule_id, level, title, message, timestamp, state, resolved, \
         resolved_at, resolved_by, acknowledged, acknowledged_at, acknowledged_by, \
         escalated_at, data FROM alerts WHERE 1=1",
    );
    if let Some(status) = status {
        qb.push(" AND state = ").push_bind(status.to_string());
    }
    if let Some(hours) = hours {
        let since = Utc::now() - chrono::Duration::hours(hours);
        qb.push(" AND timestamp >= ").push_bind(since);
    }
    qb.push(" ORDER BY timestamp DESC LIMIT ").push_bind(limit.clamp(1, 10_000));

    let rows = qb.build_query_as::<AlertRow>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(AlertRow::into_alert).collect())
}

/// Unresolved alerts for a rule fired within `since` — the suppression
/// check from the alert state machine.
pub async fn unresolved_since(
    pool: &PgPool,
    rule_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<Alert>, StoreError> {
    let rows = sqlx::query_as::<_, AlertRow>(
        r#"
        SELECT id, rule_id, level, title, message, timestamp, state, resolved,
               resolved_at, resolved_by, acknowledged, acknowledged_at,
               acknowledged_by, escalated_at, data
        FROM alerts
        WHERE rule_id = $1 AND resolved = false AND timestamp >= $2
        ORDER BY timestamp DESC
        "#,
    )
    .bind(rule_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(AlertRow::into_alert).collect())
}

/// Active, unacknowledged alerts eligible for the lifecycle worker's
/// escalation scan — recomputed from the persisted `timestamp`
/// (`fired_at`) rather than in-memory state, per spec.md §9.
pub async fn active_unacknowledged(pool: &PgPool) -> Result<Vec<Alert>, StoreError> {
    let rows = sqlx::query_as::<_, AlertRow>(
        r#"
        SELECT id, rule_id, level, title, message, timestamp, state, resolved,
               resolved_at, resolved_by, acknowledged, acknowledged_at,
               acknowledged_by, escalated_at, data
        FROM alerts
        WHERE resolved = false AND acknowledged = false AND escalated_at IS NULL
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(AlertRow::into_alert).collect())
}

pub async fn acknowledge(
    pool: &PgPool,
    id: Uuid,
    actor: &str,
    at: DateTime<Utc>,
) -> Result<Option<Alert>, StoreError> {
    let row = sqlx::query_as::<_, AlertRow>(
        r#"
        UPDATE alerts
        SET state = 'acknowledged', acknowledged = true, acknowledged_at = $2, acknowledged_by = $3
        WHERE id = $1 AND resolved = false
        RETURNING id, rule_id, level, title, message, timestamp, state, resolved,
                  resolved_at, resolved_by, acknowledged, acknowledged_at,
                  acknowledged_by, escalated_at, data
        "#,
    )
    .bind(id)
    .bind(at)
    .bind(actor)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(AlertRow::into_alert))
}

/// Resolved alerts are terminal (spec.md §3 invariant) — this only
/// transitions rows that are not already resolved.
pub async fn resolve(
    pool: &PgPool,
    id: Uuid,
    actor: &str,
    at: DateTime<Utc>,
) -> Result<Option<Alert>, StoreError> {
    let row = sqlx::query_as::<_, AlertRow>(
        r#"
        UPDATE alerts
        SET state = 'resolved', resolved = true, resolved_at = $2, resolved_by = $3
        WHERE id = $1 AND resolved = false
        RETURNING id, rule_id, level, title, message, timestamp, state, resolved,
                  resolved_at, resolved_by, acknowledged, acknowledged_at,
                  acknowledged_by, escalated_at, data
        "#,
    )
    .bind(id)
    .bind(at)
    .bind(actor)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(AlertRow::into_alert))
}

/// Mark an alert escalated. Only one escalation per originating alert —
/// the `escalated_at IS NULL` guard makes the transition idempotent under
/// concurrent lifecycle-worker ticks.
pub async fn mark_escalated(
    pool: &PgPool,
    id: Uuid,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE alerts SET state = 'escalated', escalated_at = $2
        WHERE id = $1 AND escalated_at IS NULL
        "#,
    )
    .bind(id)
    .bind(at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StateCount {
    pub state: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LevelCount {
    pub level: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HourlyCount {
    pub hour: DateTime<Utc>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertStats {
    pub by_state: Vec<StateCount>,
    pub by_level: Vec<LevelCount>,
    pub hourly_trend: Vec<HourlyCount>,
}

/// `GET /api/v1/alerts/stats` — by-status, by-level, and a 24h hourly
/// trend.
pub async fn stats(pool: &PgPool) -> Result<AlertStats, StoreError> {
    let by_state = sqlx::query_as::<_, StateCount>(
        "SELECT state, COUNT(*) AS count FROM alerts GROUP BY state ORDER BY count DESC",
    )
    .fetch_all(pool)
    .await?;

    let by_level = sqlx::query_as::<_, LevelCount>(
        "SELECT level, COUNT(*) AS count FROM alerts GROUP BY level ORDER BY count DESC",
    )
    .fetch_all(pool)
    .await?;

    let hourly_trend = sqlx::query_as::<_, HourlyCount>(
        r#"
        SELECT date_trunc('hour', timestamp) AS hour, COUNT(*) AS count
        FROM alerts
        WHERE timestamp >= now() - interval '24 hours'
        GROUP BY hour
        ORDER BY hour ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(AlertStats {
        by_state,
        by_level,
        hourly_trend,
    })
}
