//! Exchanges, durable queues, manual ack, prefetch backpressure, and DLQ
//! routing, built once on top of any [`Transport`].
//!
//! Routing keys already carry the exchange name as their leading token
//! (`events.web.click` on exchange `events`), matching the subject
//! convention the teacher's services use everywhere
//! (`auth.events.user.created`, `gl.events.posting.requested`) — so
//! `publish`/`declare_queue` pass the routing key straight through to the
//! transport as the subject, instead of inventing a second addressing
//! scheme.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::StreamExt;
use sf_domain::MessageEnvelope;
use tokio::sync::{Mutex, Notify, RwLock, Semaphore};
use uuid::Uuid;

use crate::retry::{retry_with_backoff, RetryConfig};
use crate::transport::Transport;

pub const DEFAULT_PREFETCH: usize = 10;
pub const DEFAULT_DLQ_TTL_MS: u64 = 300_000;

#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    #[error("fabric is not connected")]
    FabricUnavailable,
    #[error("exchange '{0}' was not declared")]
    UnknownExchange(String),
    #[error("queue '{0}' was not declared")]
    UnknownQueue(String),
    #[error("routing key '{routing_key}' does not belong to exchange '{exchange}'")]
    RoutingKeyMismatch { exchange: String, routing_key: String },
    #[error(transparent)]
    Transport(#[from] crate::transport::TransportError),
}

pub type FabricResult<T> = Result<T, FabricError>;

struct BufferedMessage {
    envelope: MessageEnvelope,
    subject: String,
    attempts: u32,
    enqueued_at: DateTime<Utc>,
}

struct QueueState {
    #[allow(dead_code)]
    exchange: String,
    dlq_name: Option<String>,
    dlq_ttl_ms: u64,
    buffer: Mutex<VecDeque<BufferedMessage>>,
    notify: Notify,
}

impl QueueState {
    async fn push(&self, msg: BufferedMessage) {
        self.buffer.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Pop the next message that hasn't expired (DLQ TTL), dropping any
    /// expired entries it encounters along the way.
    async fn pop(&self) -> Option<BufferedMessage> {
        let mut buf = self.buffer.lock().await;
        while let Some(front) = buf.pop_front() {
            if self.dlq_ttl_ms > 0 {
                let age_ms = (Utc::now() - front.enqueued_at).num_milliseconds().max(0) as u64;
                if age_ms > self.dlq_ttl_ms {
                    tracing::debug!(subject = %front.subject, age_ms, "dropping expired DLQ message");
                    continue;
                }
            }
            return Some(front);
        }
        None
    }
}

/// A callback invoked per delivered message. Returning `Err` causes the
/// message to be retried with backoff, then rejected to the DLQ once the
/// retry budget is exhausted.
pub type ConsumeHandler =
    Arc<dyn Fn(MessageEnvelope, String) -> BoxFuture<'static, Result<(), String>> + Send + Sync>;

/// The message fabric: `declare_exchange`, `declare_queue`, `publish`,
/// `consume`, per the broker topology contract.
pub struct Fabric {
    transport: Arc<dyn Transport>,
    exchanges: RwLock<HashSet<String>>,
    queues: RwLock<HashMap<String, Arc<QueueState>>>,
    connected: AtomicBool,
}

impl Fabric {
    pub fn new(transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            exchanges: RwLock::new(HashSet::new()),
            queues: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(true),
        })
    }

    /// Simulates a broker disconnect, for exercising `FabricUnavailable`.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub async fn declare_exchange(&self, exchange: &str) -> FabricResult<()> {
        self.exchanges.write().await.insert(exchange.to_string());
        Ok(())
    }

    /// Declares a durable queue bound to `routing_key` (a literal key or a
    /// `*`/`>` wildcard pattern) on `exchange`, and — when `durable` is set
    /// — its paired `<name>.dlq` dead-letter queue via a parallel DLX,
    /// keyed identically. Spawns the background collector that feeds the
    /// queue's retention buffer from the transport.
    pub async fn declare_queue(
        self: &Arc<Self>,
        name: &str,
        routing_key: &str,
        exchange: &str,
        durable: bool,
        dlq_ttl_ms: Option<u64>,
    ) -> FabricResult<()> {
        if !self.exchanges.read().await.contains(exchange) {
            return Err(FabricError::UnknownExchange(exchange.to_string()));
        }

        let dlq_name = if durable {
            Some(format!("{name}.dlq"))
        } else {
            None
        };

        let state = Arc::new(QueueState {
            exchange: exchange.to_string(),
            dlq_name: dlq_name.clone(),
            dlq_ttl_ms: 0,
            buffer: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        });
        self.queues.write().await.insert(name.to_string(), state);
        self.spawn_collector(name.to_string(), routing_key.to_string());

        if let Some(dlq) = dlq_name {
            let dlq_state = Arc::new(QueueState {
                exchange: exchange.to_string(),
                dlq_name: None,
                dlq_ttl_ms: dlq_ttl_ms.unwrap_or(DEFAULT_DLQ_TTL_MS),
                buffer: Mutex::new(VecDeque::new()),
                notify: Notify::new(),
            });
            self.queues.write().await.insert(dlq, dlq_state);
        }

        Ok(())
    }

    fn spawn_collector(self: &Arc<Self>, queue: String, pattern: String) {
        let this = self.clone();
        tokio::spawn(async move {
            let mut stream = match this.transport.subscribe(&pattern).await {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(queue, pattern, error = %e, "queue collector failed to subscribe");
                    return;
                }
            };
            while let Some(raw) = stream.next().await {
                let envelope: MessageEnvelope = match serde_json::from_slice(&raw.payload) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::error!(queue, subject = %raw.subject, error = %e, "dropping undecodable message");
                        continue;
                    }
                };
                let queues = this.queues.read().await;
                if let Some(state) = queues.get(&queue) {
                    state
                        .push(BufferedMessage {
                            envelope,
                            subject: raw.subject,
                            attempts: 0,
                            enqueued_at: Utc::now(),
                        })
                        .await;
                }
            }
        });
    }

    pub async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        envelope: MessageEnvelope,
    ) -> FabricResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(FabricError::FabricUnavailable);
        }
        if !self.exchanges.read().await.contains(exchange) {
            return Err(FabricError::UnknownExchange(exchange.to_string()));
        }
        if !routing_key.starts_with(&format!("{exchange}.")) && routing_key != exchange {
            return Err(FabricError::RoutingKeyMismatch {
                exchange: exchange.to_string(),
                routing_key: routing_key.to_string(),
            });
        }
        let payload = serde_json::to_vec(&envelope)
            .map_err(|e| FabricError::Transport(crate::transport::TransportError::Publish {
                subject: routing_key.to_string(),
                source: e.to_string(),
            }))?;
        self.transport.publish(routing_key, payload).await?;
        Ok(())
    }

    /// Consume `queue` with manual acknowledgement and a bounded prefetch.
    /// `handler` failures are retried with backoff; once the retry budget
    /// is exhausted, the message is rejected to `<queue>.dlq` when one
    /// exists, or dropped with an error log otherwise. `auto_ack` skips
    /// retry/DLQ routing entirely — failures are logged and the message is
    /// dropped, matching a fire-and-forget consumer.
    pub async fn consume(
        self: &Arc<Self>,
        queue: &str,
        handler: ConsumeHandler,
        auto_ack: bool,
    ) -> FabricResult<()> {
        self.consume_with_prefetch(queue, handler, auto_ack, DEFAULT_PREFETCH).await
    }

    pub async fn consume_with_prefetch(
        self: &Arc<Self>,
        queue: &str,
        handler: ConsumeHandler,
        auto_ack: bool,
        prefetch: usize,
    ) -> FabricResult<()> {
        let state = self
            .queues
            .read()
            .await
            .get(queue)
            .cloned()
            .ok_or_else(|| FabricError::UnknownQueue(queue.to_string()))?;
        let dlq_target = state.dlq_name.clone();
        let this = self.clone();
        let queue = queue.to_string();
        let semaphore = Arc::new(Semaphore::new(prefetch.max(1)));
        let retry_config = RetryConfig::default();

        tokio::spawn(async move {
            loop {
                let msg = loop {
                    if let Some(m) = state.pop().await {
                        break m;
                    }
                    state.notify.notified().await;
                };

                let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
                let handler = handler.clone();
                let this = this.clone();
                let dlq_target = dlq_target.clone();
                let queue = queue.clone();
                let retry_config = retry_config.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    let envelope = msg.envelope.clone();
                    let subject = msg.subject.clone();

                    if auto_ack {
                        if let Err(e) = handler(envelope, subject.clone()).await {
                            tracing::warn!(queue, subject, error = %e, "auto-ack handler failed, message dropped");
                        }
                        return;
                    }

                    let result = retry_with_backoff(
                        || {
                            let handler = handler.clone();
                            let envelope = envelope.clone();
                            let subject = subject.clone();
                            async move { handler(envelope, subject).await }
                        },
                        &retry_config,
                        &queue,
                    )
                    .await;

                    if let Err(err) = result {
                        tracing::error!(queue, subject, error = %err, attempts = msg.attempts + retry_config.max_attempts, "message rejected after retries exhausted");
                        if let Some(dlq_name) = dlq_target {
                            let queues = this.queues.read().await;
                            if let Some(dlq_state) = queues.get(&dlq_name) {
                                dlq_state
                                    .push(BufferedMessage {
                                        envelope: msg.envelope,
                                        subject: msg.subject,
                                        attempts: msg.attempts + retry_config.max_attempts,
                                        enqueued_at: Utc::now(),
                                    })
                                    .await;
                            }
                        }
                    }
                });
            }
        });

        Ok(())
    }

    /// Depth of a declared queue's retention buffer — used by readiness
    /// probes and tests, not part of the public broker contract.
    pub async fn queue_depth(&self, queue: &str) -> Option<usize> {
        let queues = self.queues.read().await;
        let state = queues.get(queue)?;
        Some(state.buffer.lock().await.len())
    }
}

/// Convenience for building a routing key with a correlation id stamped,
/// used by producers that want the envelope headers populated uniformly.
pub fn stamp_correlation_id(mut envelope: MessageEnvelope, correlation_id: Option<String>) -> MessageEnvelope {
    let cid = correlation_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    envelope.correlation_id = Some(cid);
    envelope
}

/// Standard retry/backoff pause used by background publishers polling an
/// outbox table, kept here so every service shares one tuning point.
pub const OUTBOX_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::InMemoryTransport;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Mutex as TokioMutex;

    async fn new_fabric() -> Arc<Fabric> {
        Fabric::new(Arc::new(InMemoryTransport::new()))
    }

    #[tokio::test]
    async fn publish_requires_declared_exchange() {
        let fabric = new_fabric().await;
        let env = MessageEnvelope::new("events.web.click", serde_json::json!({}));
        let err = fabric.publish("events", "events.web.click", env).await.unwrap_err();
        assert!(matches!(err, FabricError::UnknownExchange(_)));
    }

    #[tokio::test]
    async fn publish_rejects_mismatched_routing_key() {
        let fabric = new_fabric().await;
        fabric.declare_exchange("events").await.unwrap();
        let env = MessageEnvelope::new("analytics.metrics", serde_json::json!({}));
        let err = fabric.publish("events", "analytics.metrics", env).await.unwrap_err();
        assert!(matches!(err, FabricError::RoutingKeyMismatch { .. }));
    }

    #[tokio::test]
    async fn consume_delivers_and_acks_on_success() {
        let fabric = new_fabric().await;
        fabric.declare_exchange("events").await.unwrap();
        fabric
            .declare_queue("analytics.events", "events.>", "events", true, None)
            .await
            .unwrap();

        let received = Arc::new(TokioMutex::new(Vec::<String>::new()));
        let received_clone = received.clone();
        let handler: ConsumeHandler = Arc::new(move |envelope, _subject| {
            let received = received_clone.clone();
            Box::pin(async move {
                received.lock().await.push(envelope.routing_key.clone());
                Ok(())
            })
        });
        fabric.consume("analytics.events", handler, false).await.unwrap();

        let env = MessageEnvelope::new("events.web.click", serde_json::json!({"a": 1}));
        fabric.publish("events", "events.web.click", env).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(received.lock().await.as_slice(), ["events.web.click"]);
    }

    #[tokio::test]
    async fn failed_handler_lands_in_dlq_after_retries() {
        let fabric = new_fabric().await;
        fabric.declare_exchange("events").await.unwrap();
        fabric
            .declare_queue("storage.events", "events.*", "events", true, Some(60_000))
            .await
            .unwrap();

        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        let handler: ConsumeHandler = Arc::new(move |_envelope, _subject| {
            attempts_clone.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Err("boom".to_string()) })
        });
        fabric.consume("storage.events", handler, false).await.unwrap();

        let env = MessageEnvelope::new("events.error", serde_json::json!({}));
        fabric.publish("events", "events.error", env).await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(attempts.load(Ordering::SeqCst) >= 3);
        assert_eq!(fabric.queue_depth("storage.events.dlq").await, Some(1));
    }

    #[tokio::test]
    async fn disconnected_fabric_rejects_publish() {
        let fabric = new_fabric().await;
        fabric.declare_exchange("events").await.unwrap();
        fabric.set_connected(false);
        let env = MessageEnvelope::new("events.web.click", serde_json::json!({}));
        let err = fabric.publish("events", "events.web.click", env).await.unwrap_err();
        assert!(matches!(err, FabricError::FabricUnavailable));
    }
}
