use sf_domain::Alert;

use super::NotificationChannel;

/// Generic outbound webhook: POSTs the alert as JSON to a configured URL.
/// Distinct from [`super::slack::SlackChannel`] in payload shape only.
pub struct WebhookChannel {
    url: Option<String>,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(url: Option<String>) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    fn is_available(&self) -> bool {
        self.url.is_some()
    }

    async fn send(&self, alert: &Alert) -> Result<(), String> {
        let url = self
            .url
            .as_ref()
            .ok_or_else(|| "webhook channel has no url configured".to_string())?;
        let response = self
            .client
            .post(url)
            .json(alert)
            .send()
            .await
            .map_err(|e| format!("webhook request failed: {e}"))?;
        if !response.status().is_success() {
            return Err(format!("webhook returned status {}", response.status()));
        }
        Ok(())
    }
}
