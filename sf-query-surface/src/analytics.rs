//! The four analytics dashboards from spec.md §4.G, shaped like the
//! teacher's `gl::repos::report_query_repo`: bounded, read-only, time-scoped
//! queries returning `FromRow`/`Serialize` structs, with the bucket and
//! device-classification logic pulled out as pure functions so they can be
//! unit tested without a database.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use sf_store::error::StoreError;

/// A window of the event trends dashboard: `hours` must be in `1..=168`
/// (one week) and `interval_minutes` in `5..=1440` (one day), mirroring the
/// original service's `Query` bounds.
pub fn validate_trend_window(hours: i64, interval_minutes: i64) -> Result<(), StoreError> {
    if !(1..=168).contains(&hours) {
        return Err(StoreError::InvalidQuery(format!(
            "hours must be in 1..=168, got {hours}"
        )));
    }
    if !(5..=1440).contains(&interval_minutes) {
        return Err(StoreError::InvalidQuery(format!(
            "interval_minutes must be in 5..=1440, got {interval_minutes}"
        )));
    }
    Ok(())
}

/// Floor `ts` to the start of the `interval_minutes`-wide bucket it falls
/// in, anchored to the Unix epoch so bucket boundaries are stable across
/// calls regardless of `ts`'s minute-of-hour.
pub fn bucket_start(ts: DateTime<Utc>, interval_minutes: i64) -> DateTime<Utc> {
    let interval_minutes = interval_minutes.max(1);
    let epoch_minutes = ts.timestamp().div_euclid(60);
    let bucket_minutes = epoch_minutes.div_euclid(interval_minutes) * interval_minutes;
    DateTime::from_timestamp(bucket_minutes * 60, 0).unwrap_or(ts)
}

#[derive(Debug, Clone, Serialize)]
pub struct EventTrendBucket {
    pub bucket_start: DateTime<Utc>,
    pub total: i64,
    pub by_type_breakdown: HashMap<String, i64>,
}

#[derive(Debug, Clone, FromRow)]
struct TrendRow {
    timestamp: DateTime<Utc>,
    #[sqlx(rename = "type")]
    event_type: String,
}

/// Event trends over the trailing `hours`, bucketed by `interval_minutes`.
/// Buckets with zero events are omitted, the way a `GROUP BY` over absent
/// rows naturally omits them.
pub async fn event_trends(
    pool: &PgPool,
    hours: i64,
    interval_minutes: i64,
) -> Result<Vec<EventTrendBucket>, StoreError> {
    validate_trend_window(hours, interval_minutes)?;

    let end_time = Utc::now();
    let start_time = end_time - chrono::Duration::hours(hours);

    let rows = sqlx::query_as::<_, TrendRow>(
        "SELECT timestamp, type FROM events WHERE timestamp >= $1 AND timestamp <= $2",
    )
    .bind(start_time)
    .bind(end_time)
    .fetch_all(pool)
    .await?;

    let mut buckets: HashMap<DateTime<Utc>, EventTrendBucket> = HashMap::new();
    for row in rows {
        let bucket = bucket_start(row.timestamp, interval_minutes);
        let entry = buckets.entry(bucket).or_insert_with(|| EventTrendBucket {
            bucket_start: bucket,
            total: 0,
            by_type_breakdown: HashMap::new(),
        });
        entry.total += 1;
        *entry.by_type_breakdown.entry(row.event_type).or_insert(0) += 1;
    }

    let mut result: Vec<EventTrendBucket> = buckets.into_values().collect();
    result.sort_by_key(|b| b.bucket_start);
    Ok(result)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
    Bot,
    Unknown,
}

impl DeviceType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Mobile => "Mobile",
            DeviceType::Tablet => "Tablet",
            DeviceType::Desktop => "Desktop",
            DeviceType::Bot => "Bot",
            DeviceType::Unknown => "Unknown",
        }
    }
}

const DESKTOP_BROWSER_TOKENS: &[&str] =
    &["chrome", "firefox", "safari", "edge", "opera", "msie", "trident", "gecko"];

/// Classify a user-agent string, per spec.md §4.G: mobile/android/iphone
/// tokens win first, then bot/crawler (checked before desktop browser
/// tokens, since many real crawler user-agents embed a browser token like
/// `Chrome/...` to avoid being blocked), then recognized desktop browser
/// tokens, else `Unknown`.
pub fn classify_device(user_agent: &str) -> DeviceType {
    let ua = user_agent.to_lowercase();
    if ua.contains("mobile") || ua.contains("android") || ua.contains("iphone") {
        DeviceType::Mobile
    } else if ua.contains("tablet") || ua.contains("ipad") {
        DeviceType::Tablet
    } else if ua.contains("bot") || ua.contains("crawler") {
        DeviceType::Bot
    } else if DESKTOP_BROWSER_TOKENS.iter().any(|t| ua.contains(t)) {
        DeviceType::Desktop
    } else {
        DeviceType::Unknown
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDistributionEntry {
    pub name: String,
    pub users: i64,
    pub events: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, FromRow)]
struct UserAgentRow {
    user_agent: String,
    user_id: Option<String>,
}

/// User distribution by device type over the trailing 7 days.
pub async fn user_distribution(pool: &PgPool) -> Result<Vec<UserDistributionEntry>, StoreError> {
    let since = Utc::now() - chrono::Duration::days(7);
    let rows = sqlx::query_as::<_, UserAgentRow>(
        r#"
        SELECT data->>'user_agent' AS user_agent, user_id
        FROM events
        WHERE data->>'user_agent' IS NOT NULL AND timestamp >= $1
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let mut users: HashMap<DeviceType, std::collections::HashSet<String>> = HashMap::new();
    let mut events: HashMap<DeviceType, i64> = HashMap::new();

    for row in rows {
        let device = classify_device(&row.user_agent);
        *events.entry(device).or_insert(0) += 1;
        if let Some(user_id) = row.user_id {
            users.entry(device).or_default().insert(user_id);
        }
    }

    let total_users: i64 = users.values().map(|s| s.len() as i64).sum();

    let mut result: Vec<UserDistributionEntry> = events
        .into_iter()
        .map(|(device, event_count)| {
            let user_count = users.get(&device).map(|s| s.len() as i64).unwrap_or(0);
            let percentage = if total_users > 0 {
                (user_count as f64 / total_users as f64 * 100.0 * 10.0).round() / 10.0
            } else {
                0.0
            };
            UserDistributionEntry {
                name: device.as_str().to_string(),
                users: user_count,
                events: event_count,
                percentage,
            }
        })
        .collect();

    result.sort_by(|a, b| b.users.cmp(&a.users));
    Ok(result)
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TopSource {
    pub source: String,
    pub event_count: i64,
    pub unique_users: i64,
    pub avg_age_hours: f64,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
struct TopSourceRow {
    source: String,
    event_count: i64,
    unique_users: i64,
    avg_age_seconds: Option<f64>,
    last_seen: Option<DateTime<Utc>>,
}

/// Top sources over the trailing 24 hours, ordered by event count.
pub async fn top_sources(pool: &PgPool, limit: i64) -> Result<Vec<TopSource>, StoreError> {
    if !(1..=50).contains(&limit) {
        return Err(StoreError::InvalidQuery(format!(
            "limit must be in 1..=50, got {limit}"
        )));
    }

    let rows = sqlx::query_as::<_, TopSourceRow>(
        r#"
        SELECT
            source,
            COUNT(*) AS event_count,
            COUNT(DISTINCT user_id) AS unique_users,
            AVG(EXTRACT(epoch FROM (NOW() - timestamp))) AS avg_age_seconds,
            MAX(timestamp) AS last_seen
        FROM events
        WHERE timestamp >= NOW() - INTERVAL '24 hours'
        GROUP BY source
        ORDER BY event_count DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| TopSource {
            source: r.source,
            event_count: r.event_count,
            unique_users: r.unique_users,
            avg_age_hours: r
                .avg_age_seconds
                .map(|s| (s / 3600.0 * 10.0).round() / 10.0)
                .unwrap_or(0.0),
            last_seen: r.last_seen,
        })
        .collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct EventTypeDistributionEntry {
    pub name: String,
    pub count: i64,
    pub unique_users: i64,
    pub unique_sources: i64,
    pub avg_processing_time: Option<f64>,
    pub percentage: f64,
}

#[derive(Debug, Clone, FromRow)]
struct EventTypeRow {
    #[sqlx(rename = "type")]
    event_type: String,
    count: i64,
    unique_users: i64,
    unique_sources: i64,
    avg_processing_time: Option<f64>,
}

/// Event-type distribution over the trailing 24 hours.
pub async fn event_type_distribution(
    pool: &PgPool,
) -> Result<Vec<EventTypeDistributionEntry>, StoreError> {
    let rows = sqlx::query_as::<_, EventTypeRow>(
        r#"
        SELECT
            type,
            COUNT(*) AS count,
            COUNT(DISTINCT user_id) AS unique_users,
            COUNT(DISTINCT source) AS unique_sources,
            AVG(
                CASE WHEN data->>'processing_time' IS NOT NULL
                     THEN (data->>'processing_time')::float8
                     ELSE NULL
                END
            ) AS avg_processing_time
        FROM events
        WHERE timestamp >= NOW() - INTERVAL '24 hours'
        GROUP BY type
        ORDER BY count DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let total_events: i64 = rows.iter().map(|r| r.count).sum();

    Ok(rows
        .into_iter()
        .map(|r| {
            let percentage = if total_events > 0 {
                (r.count as f64 / total_events as f64 * 100.0 * 10.0).round() / 10.0
            } else {
                0.0
            };
            EventTypeDistributionEntry {
                name: r.event_type,
                count: r.count,
                unique_users: r.unique_users,
                unique_sources: r.unique_sources,
                avg_processing_time: r.avg_processing_time.map(|t| (t * 1000.0).round() / 1000.0),
                percentage,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_mobile_before_bot() {
        assert_eq!(classify_device("Mozilla/5.0 (Linux; Android 13)"), DeviceType::Mobile);
        assert_eq!(classify_device("Mozilla/5.0 (iPhone; CPU iPhone OS 16_0)"), DeviceType::Mobile);
    }

    #[test]
    fn classifies_tablet() {
        assert_eq!(classify_device("Mozilla/5.0 (iPad; CPU OS 16_0)"), DeviceType::Tablet);
    }

    #[test]
    fn classifies_bot_even_with_browser_token() {
        assert_eq!(
            classify_device("Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html) Chrome/90"),
            DeviceType::Bot
        );
    }

    #[test]
    fn classifies_desktop_browser() {
        assert_eq!(
            classify_device("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/114.0"),
            DeviceType::Desktop
        );
    }

    #[test]
    fn classifies_unknown_for_unrecognized_agent() {
        assert_eq!(classify_device("some-internal-script/1.0"), DeviceType::Unknown);
    }

    #[test]
    fn bucket_start_floors_to_interval() {
        let ts = DateTime::parse_from_rfc3339("2026-01-01T10:47:12Z").unwrap().with_timezone(&Utc);
        let bucketed = bucket_start(ts, 15);
        assert_eq!(bucketed.to_rfc3339(), "2026-01-01T10:45:00+00:00");
    }

    #[test]
    fn bucket_start_is_idempotent() {
        let ts = DateTime::parse_from_rfc3339("2026-01-01T10:45:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(bucket_start(ts, 60), bucket_start(bucket_start(ts, 60), 60));
    }

    #[test]
    fn validate_trend_window_rejects_out_of_range() {
        assert!(validate_trend_window(0, 60).is_err());
        assert!(validate_trend_window(169, 60).is_err());
        assert!(validate_trend_window(24, 4).is_err());
        assert!(validate_trend_window(24, 1441).is_err());
        assert!(validate_trend_window(24, 60).is_ok());
    }
}
