//! The `{success, message, data?, error?, timestamp, correlation_id?}`
//! response envelope every HTTP surface in the pipeline returns, and the
//! mapping from [`CoreError`] to status codes, mirroring the teacher's
//! `ErrorResponse` + `IntoResponse` pattern repeated in every service's
//! `routes/*.rs`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CoreError;

#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl<T: Serialize> ApiEnvelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Option<String>) -> Self {
        self.correlation_id = correlation_id;
        self
    }
}

impl ApiEnvelope<()> {
    pub fn err(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiEnvelope<T> {
    fn into_response(self) -> Response {
        let status = if self.success {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        };
        (status, Json(self)).into_response()
    }
}

/// Map a classified core error onto the envelope + status code a caller
/// should see. `Fatal` errors are never expected to reach here — they
/// abort the process before any request is served — but are mapped
/// defensively rather than panicking.
pub fn error_response(err: &CoreError) -> Response {
    let status = match err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::DataIntegrity(_) => StatusCode::CONFLICT,
        CoreError::Policy(_) => StatusCode::OK,
        CoreError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ApiEnvelope::<()>::err("request failed", err.to_string());
    (status, Json(body)).into_response()
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        error_response(&self)
    }
}
