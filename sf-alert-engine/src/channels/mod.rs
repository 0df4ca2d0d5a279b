//! Pluggable notification channels. Each channel is raced under its own
//! timeout so a slow or down provider never stalls the others — the
//! "failures isolated per channel" requirement.

mod email;
mod slack;
mod webhook;

pub use email::EmailChannel;
pub use slack::SlackChannel;
pub use webhook::WebhookChannel;

use std::time::Duration;

use sf_domain::Alert;

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait::async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this channel is configured to actually deliver (e.g. has a
    /// webhook URL set). An unavailable channel is skipped, not retried.
    fn is_available(&self) -> bool;

    async fn send(&self, alert: &Alert) -> Result<(), String>;
}

/// Dispatch `alert` to every channel named in `channel_names`, racing each
/// under [`DEFAULT_SEND_TIMEOUT`]. One channel's failure or timeout never
/// prevents the others from being attempted.
pub async fn dispatch(
    channels: &[Box<dyn NotificationChannel>],
    channel_names: &[String],
    alert: &Alert,
) {
    for name in channel_names {
        let Some(channel) = channels.iter().find(|c| c.name() == name) else {
            tracing::warn!(channel = %name, "unknown notification channel requested, skipping");
            continue;
        };
        if !channel.is_available() {
            tracing::debug!(channel = %name, "channel unavailable, skipping");
            continue;
        }
        match tokio::time::timeout(DEFAULT_SEND_TIMEOUT, channel.send(alert)).await {
            Ok(Ok(())) => {
                tracing::info!(channel = %name, alert_id = %alert.id, "notification delivered");
            }
            Ok(Err(e)) => {
                tracing::warn!(channel = %name, alert_id = %alert.id, error = %e, "notification channel send failed");
                crate::metrics::NOTIFICATIONS_FAILED
                    .with_label_values(&[name, "send_failed"])
                    .inc();
            }
            Err(_) => {
                tracing::warn!(channel = %name, alert_id = %alert.id, "notification channel send timed out");
                crate::metrics::NOTIFICATIONS_FAILED
                    .with_label_values(&[name, "timeout"])
                    .inc();
            }
        }
    }
}
