//! Background drain loop for the ingestion outbox, generalized from
//! `subscriptions::publisher::run_publisher`: poll unpublished rows,
//! publish each through the fabric, mark it published. Failure of a
//! publish does not fail the original HTTP request — it's simply retried
//! on the next tick.

use std::sync::Arc;
use std::time::Duration;

use sf_domain::MessageEnvelope;
use sf_fabric::Fabric;
use sqlx::PgPool;
use tokio::sync::watch;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const BATCH_SIZE: i64 = 100;

/// Runs until `shutdown` fires, then drains one final pass — "implementations
/// must drain on graceful stop" from spec.md §4.C.
pub async fn run(pool: PgPool, fabric: Arc<Fabric>, mut shutdown: watch::Receiver<bool>) {
    tracing::info!("starting ingestion outbox publisher");
    loop {
        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {
                if let Err(e) = drain_once(&pool, &fabric).await {
                    tracing::error!(error = %e, "outbox drain pass failed");
                }
            }
            _ = shutdown.changed() => {
                tracing::info!("shutdown signalled, draining outbox one last time");
                if let Err(e) = drain_once(&pool, &fabric).await {
                    tracing::error!(error = %e, "final outbox drain failed");
                }
                break;
            }
        }
    }
}

async fn drain_once(pool: &PgPool, fabric: &Arc<Fabric>) -> Result<usize, sf_store::StoreError> {
    let rows = sf_store::outbox::fetch_unpublished(pool, BATCH_SIZE).await?;
    let mut published = 0;
    for row in rows {
        let exchange = row
            .routing_key
            .split('.')
            .next()
            .unwrap_or(sf_fabric::topology::EXCHANGE_EVENTS);
        let envelope = MessageEnvelope::new(row.routing_key.clone(), row.payload.clone())
            .with_correlation_id(row.correlation_id.clone());

        match fabric.publish(exchange, &row.routing_key, envelope).await {
            Ok(()) => {
                sf_store::outbox::mark_published(pool, row.id).await?;
                published += 1;
            }
            Err(e) => {
                crate::metrics::PUBLISH_FAILURES
                    .with_label_values(&[row.routing_key.as_str()])
                    .inc();
                tracing::warn!(outbox_id = row.id, error = %e, "publish failed, will retry next tick");
            }
        }
    }
    if published > 0 {
        tracing::debug!(published, "drained outbox rows");
    }
    Ok(published)
}
