//! `POST /api/v1/backup` and `POST /api/v1/cleanup`, the storage
//! service's admin surface, per spec.md §4.F.

use axum::extract::State;
use sf_domain::response::ApiEnvelope;
use sf_domain::CoreError;
use sf_store::backup::EventBackupRow;
use sf_store::retention::SweepReport;

use crate::AppState;

pub async fn backup(
    State(state): State<AppState>,
) -> Result<ApiEnvelope<Vec<EventBackupRow>>, CoreError> {
    let rows = sf_store::backup::export_events(&state.pool).await?;
    Ok(ApiEnvelope::ok("backup exported", rows))
}

/// Run a retention sweep on demand, outside of the hourly cadence
/// `retention_worker` already drives. Uses the same sweep function so the
/// two never disagree on cutoff semantics.
pub async fn cleanup(
    State(state): State<AppState>,
) -> Result<ApiEnvelope<SweepReport>, CoreError> {
    let sweep_start = chrono::Utc::now();
    let report = sf_store::retention::run_sweep(&state.pool, sweep_start).await?;
    for (event_type, deleted) in &report.deleted_by_type {
        if *deleted > 0 {
            crate::metrics::RETENTION_DELETED
                .with_label_values(&[event_type.as_str()])
                .inc_by(*deleted);
        }
    }
    Ok(ApiEnvelope::ok("retention sweep completed", report))
}
