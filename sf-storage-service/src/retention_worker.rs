//! The periodic retention sweep, shaped like the teacher's outbox
//! publisher loop: wake on an interval, run one bounded pass, report what
//! it deleted. Runs at `config.retention_sweep_interval_secs` cadence
//! (default one hour, per spec.md §4.F).

use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::watch;

use crate::metrics;

pub async fn run(pool: PgPool, interval_secs: u64, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_once(&pool).await;
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::info!("retention sweep worker shutting down");
                    return;
                }
            }
        }
    }
}

async fn run_once(pool: &PgPool) {
    let sweep_start = chrono::Utc::now();
    match sf_store::retention::run_sweep(pool, sweep_start).await {
        Ok(report) => {
            for (event_type, deleted) in &report.deleted_by_type {
                if *deleted > 0 {
                    metrics::RETENTION_DELETED
                        .with_label_values(&[event_type.as_str()])
                        .inc_by(*deleted);
                }
            }
            tracing::info!(total_deleted = report.total_deleted(), "retention sweep completed");
        }
        Err(e) => tracing::error!(error = %e, "retention sweep failed"),
    }
}
