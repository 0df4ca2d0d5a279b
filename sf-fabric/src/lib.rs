//! Message fabric: exchanges, durable queues, prefetch-bounded manual ack
//! consumption, and DLQ routing, on top of a pluggable pub/sub transport.

pub mod fabric;
pub mod retry;
pub mod topology;
pub mod transport;

pub use fabric::{
    ConsumeHandler, Fabric, FabricError, FabricResult, DEFAULT_DLQ_TTL_MS, DEFAULT_PREFETCH,
};
pub use retry::{retry_with_backoff, RetryConfig};
pub use topology::{connect_transport, declare_standard_topology};
pub use transport::{InMemoryTransport, NatsTransport, RawMessage, Transport, TransportError};
