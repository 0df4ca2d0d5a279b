//! Connection pool construction, generalized from the teacher's
//! `gl::db::init_pool` (pooled, bounded, fast-fail acquire).

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Default pool size per spec.md §5 "pooled (default 5, overflow 10)".
pub const DEFAULT_MAX_CONNECTIONS: u32 = 15;

pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let max_connections = std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(DEFAULT_MAX_CONNECTIONS);

    let acquire_timeout_secs = std::env::var("DB_ACQUIRE_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(5);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
        .idle_timeout(Some(Duration::from_secs(300)))
        .connect(database_url)
        .await
}

/// Run the embedded migrations against `pool`. Failure here is `Fatal` per
/// spec.md §7 — callers should abort the process.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
