//! Error taxonomy shared across every service, per the five error kinds
//! the pipeline distinguishes: validation, transient, policy, fatal, and
//! data-integrity failures.

use thiserror::Error;

/// A classified error. Every component boundary converts its local error
/// type into one of these variants before it crosses a component edge
/// (HTTP response, DLQ write, log line), so callers never have to guess
/// how an error should be surfaced.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input caught at the ingestion edge or query surface.
    /// Surfaced to callers as a 4xx-equivalent response; never placed on
    /// the broker.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Broker disconnect, database deadlock, notification timeout — worth
    /// retrying with bounded backoff before being counted as failed.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Suppression, a disabled rule, a dropped alert. Not an error to
    /// callers; logged at info.
    #[error("policy decision: {0}")]
    Policy(String),

    /// Configuration invalid at startup, topology declaration failure.
    /// Aborts the affected service.
    #[error("fatal startup error: {0}")]
    Fatal(String),

    /// Duplicate insert or missing foreign key. Coerced to a no-op for
    /// events; fatal for the current message (DLQ) for alerts.
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
