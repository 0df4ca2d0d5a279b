//! Raw pub/sub transport — the layer the teacher's `EventBus` trait
//! occupied. `Fabric` builds exchanges, durable queues, prefetch, and DLQ
//! routing on top of whichever transport is plugged in, so swapping
//! in-memory for NATS never touches queue semantics.

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct RawMessage {
    pub subject: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to publish to {subject}: {source}")]
    Publish { subject: String, source: String },
    #[error("failed to subscribe to {pattern}: {source}")]
    Subscribe { pattern: String, source: String },
    #[error("transport not connected")]
    NotConnected,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), TransportError>;
    async fn subscribe(&self, pattern: &str) -> Result<BoxStream<'static, RawMessage>, TransportError>;
}

/// In-process broadcast transport, suitable for tests and the dev/single
/// node deployment path. Subject matching follows the teacher's NATS-style
/// wildcards: `*` matches one token, `>` matches one or more.
#[derive(Clone)]
pub struct InMemoryTransport {
    sender: Arc<broadcast::Sender<RawMessage>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    pub fn with_capacity(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn matches_pattern(subject: &str, pattern: &str) -> bool {
        let subject_tokens: Vec<&str> = subject.split('.').collect();
        let pattern_tokens: Vec<&str> = pattern.split('.').collect();

        let mut s_idx = 0;
        let mut p_idx = 0;
        while s_idx < subject_tokens.len() && p_idx < pattern_tokens.len() {
            let pattern_token = pattern_tokens[p_idx];
            if pattern_token == ">" {
                return true;
            } else if pattern_token == "*" {
                s_idx += 1;
                p_idx += 1;
            } else if subject_tokens[s_idx] == pattern_token {
                s_idx += 1;
                p_idx += 1;
            } else {
                return false;
            }
        }
        s_idx == subject_tokens.len() && p_idx == pattern_tokens.len()
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let msg = RawMessage {
            subject: subject.to_string(),
            payload,
        };
        // No receivers is fine — a queue collector may not have attached
        // yet, or there may be none for this subject at all.
        let _ = self.sender.send(msg);
        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> Result<BoxStream<'static, RawMessage>, TransportError> {
        let mut receiver = self.sender.subscribe();
        let pattern = pattern.to_string();
        let stream = async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(msg) => {
                        if InMemoryTransport::matches_pattern(&msg.subject, &pattern) {
                            yield msg;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "in-memory transport subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };
        Ok(stream.boxed())
    }
}

/// Production transport backed by NATS.
#[derive(Clone)]
pub struct NatsTransport {
    client: async_nats::Client,
}

impl NatsTransport {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }

    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let client = async_nats::connect(url).await.map_err(|e| TransportError::Subscribe {
            pattern: url.to_string(),
            source: e.to_string(),
        })?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Transport for NatsTransport {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| TransportError::Publish {
                subject: subject.to_string(),
                source: e.to_string(),
            })
    }

    async fn subscribe(&self, pattern: &str) -> Result<BoxStream<'static, RawMessage>, TransportError> {
        let subscriber = self
            .client
            .subscribe(pattern.to_string())
            .await
            .map_err(|e| TransportError::Subscribe {
                pattern: pattern.to_string(),
                source: e.to_string(),
            })?;
        let stream = subscriber.map(|nats_msg| RawMessage {
            subject: nats_msg.subject.to_string(),
            payload: nats_msg.payload.to_vec(),
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matching() {
        // `*` matches exactly one token — a two-token subject, not the
        // three-token `events.web.click`. Multi-segment event types need `>`.
        assert!(InMemoryTransport::matches_pattern("events.web", "events.*"));
        assert!(!InMemoryTransport::matches_pattern("events.web.click", "events.*"));
        assert!(InMemoryTransport::matches_pattern("events.web.click", "events.>"));
        assert!(!InMemoryTransport::matches_pattern("events.web.click", "analytics.*"));
        assert!(InMemoryTransport::matches_pattern("alerts.high_error_rate", "alerts.*"));
    }

    #[tokio::test]
    async fn publish_then_subscribe_roundtrip() {
        let transport = InMemoryTransport::new();
        let mut stream = transport.subscribe("events.>").await.unwrap();
        transport
            .publish("events.web.click", b"hello".to_vec())
            .await
            .unwrap();
        let msg = tokio::time::timeout(std::time::Duration::from_secs(1), stream.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(msg.subject, "events.web.click");
        assert_eq!(msg.payload, b"hello");
    }
}
