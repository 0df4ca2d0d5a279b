//! `POST /events` and `POST /events/batch`, per spec.md §4.C: validate,
//! stamp, enqueue; batch rejects only the offending items and reports
//! per-item success.

use axum::extract::State;
use axum::Json;
use sf_domain::response::ApiEnvelope;
use sf_domain::CoreError;
use serde::Serialize;

use crate::ingest::{self, EventSubmission};
use crate::metrics;
use crate::AppState;

pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Serialize)]
pub struct SubmitResult {
    pub event_id: uuid::Uuid,
}

pub async fn submit_event(
    State(state): State<AppState>,
    Json(submission): Json<EventSubmission>,
) -> Result<ApiEnvelope<SubmitResult>, CoreError> {
    let event = ingest::stamp_and_validate(submission, None).map_err(|e| {
        metrics::EVENTS_REJECTED.with_label_values(&["validation"]).inc();
        e
    })?;
    let event_id = ingest::enqueue(&state.pool, &event).await?;
    Ok(ApiEnvelope::ok(
        "event accepted",
        SubmitResult { event_id },
    ))
}

#[derive(Debug, Serialize)]
pub struct BatchItemResult {
    pub index: usize,
    pub success: bool,
    pub event_id: Option<uuid::Uuid>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub event_ids: Vec<uuid::Uuid>,
    pub items: Vec<BatchItemResult>,
}

/// Batch of size 0 is rejected; batch of size 101 is rejected; size-100
/// batches succeed end-to-end (spec.md §8 boundary behaviors). Within a
/// valid-sized batch, only the offending items are rejected.
pub async fn submit_batch(
    State(state): State<AppState>,
    Json(submissions): Json<Vec<EventSubmission>>,
) -> Result<ApiEnvelope<BatchResult>, CoreError> {
    if submissions.is_empty() {
        return Err(CoreError::Validation("batch must not be empty".into()));
    }
    if submissions.len() > MAX_BATCH_SIZE {
        return Err(CoreError::Validation(format!(
            "batch of {} exceeds the {MAX_BATCH_SIZE} item cap",
            submissions.len()
        )));
    }

    let mut event_ids = Vec::new();
    let mut items = Vec::with_capacity(submissions.len());

    for (index, submission) in submissions.into_iter().enumerate() {
        match ingest::stamp_and_validate(submission, None) {
            Ok(event) => match ingest::enqueue(&state.pool, &event).await {
                Ok(event_id) => {
                    event_ids.push(event_id);
                    items.push(BatchItemResult {
                        index,
                        success: true,
                        event_id: Some(event_id),
                        error: None,
                    });
                }
                Err(e) => items.push(BatchItemResult {
                    index,
                    success: false,
                    event_id: None,
                    error: Some(e.to_string()),
                }),
            },
            Err(e) => {
                metrics::EVENTS_REJECTED.with_label_values(&["validation"]).inc();
                items.push(BatchItemResult {
                    index,
                    success: false,
                    event_id: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(ApiEnvelope::ok(
        "batch processed",
        BatchResult { event_ids, items },
    ))
}
