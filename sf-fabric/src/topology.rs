//! The broker topology required by spec.md §6: three exchanges and the
//! four durable queues that bind them, each with a paired `.dlq`. Kept in
//! one place so every service declares the identical topology instead of
//! re-typing routing keys per `main.rs`, the generalization the teacher's
//! per-service "declare my own subjects" style doesn't need when there's
//! only one topology for the whole pipeline.

use std::sync::Arc;

use crate::fabric::{Fabric, FabricResult, DEFAULT_DLQ_TTL_MS};
use crate::transport::{InMemoryTransport, NatsTransport, Transport, TransportError};

pub const EXCHANGE_EVENTS: &str = "events";
pub const EXCHANGE_ANALYTICS: &str = "analytics";
pub const EXCHANGE_ALERTS: &str = "alerts";

pub const QUEUE_ANALYTICS_EVENTS: &str = "analytics.events";
pub const QUEUE_STORAGE_EVENTS: &str = "storage.events";
pub const QUEUE_ALERTING_ANALYTICS: &str = "alerting.analytics";
pub const QUEUE_ALERTING_DIRECT: &str = "alerting.direct";

/// Declare the three exchanges and the four standard queues (with their
/// `.dlq` pairs). Idempotent — safe to call once per service at startup.
pub async fn declare_standard_topology(fabric: &Arc<Fabric>) -> FabricResult<()> {
    fabric.declare_exchange(EXCHANGE_EVENTS).await?;
    fabric.declare_exchange(EXCHANGE_ANALYTICS).await?;
    fabric.declare_exchange(EXCHANGE_ALERTS).await?;

    fabric
        .declare_queue(
            QUEUE_ANALYTICS_EVENTS,
            "events.>",
            EXCHANGE_EVENTS,
            true,
            Some(DEFAULT_DLQ_TTL_MS),
        )
        .await?;
    fabric
        .declare_queue(
            QUEUE_STORAGE_EVENTS,
            "events.>",
            EXCHANGE_EVENTS,
            true,
            Some(DEFAULT_DLQ_TTL_MS),
        )
        .await?;
    fabric
        .declare_queue(
            QUEUE_ALERTING_ANALYTICS,
            "analytics.*",
            EXCHANGE_ANALYTICS,
            true,
            Some(DEFAULT_DLQ_TTL_MS),
        )
        .await?;
    fabric
        .declare_queue(
            QUEUE_ALERTING_DIRECT,
            "alerts.*",
            EXCHANGE_ALERTS,
            true,
            Some(DEFAULT_DLQ_TTL_MS),
        )
        .await?;

    Ok(())
}

/// Build the transport for `BUS_TYPE` (`"nats"` or `"inmemory"`), matching
/// the `match config.bus_type.as_str() { "nats" => ..., "inmemory" => ... }`
/// dispatch every teacher service's `main.rs` repeats.
pub async fn connect_transport(bus_type: &str, nats_url: &str) -> Result<Arc<dyn Transport>, TransportError> {
    match bus_type.to_lowercase().as_str() {
        "nats" => {
            tracing::info!(nats_url, "connecting to NATS transport");
            let transport = NatsTransport::connect(nats_url).await?;
            Ok(Arc::new(transport))
        }
        "inmemory" => {
            tracing::info!("using in-memory transport");
            Ok(Arc::new(InMemoryTransport::new()))
        }
        other => panic!("invalid BUS_TYPE: {other}. Must be 'nats' or 'inmemory'"),
    }
}
