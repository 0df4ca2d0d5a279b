use sf_domain::Alert;

use super::NotificationChannel;

/// Slack delivery via an incoming webhook URL. Uses the same
/// `reqwest` + rustls stack the teacher's notifications module depends on
/// for outbound provider calls.
pub struct SlackChannel {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl SlackChannel {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl NotificationChannel for SlackChannel {
    fn name(&self) -> &str {
        "slack"
    }

    fn is_available(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn send(&self, alert: &Alert) -> Result<(), String> {
        let url = self
            .webhook_url
            .as_ref()
            .ok_or_else(|| "slack channel has no webhook_url configured".to_string())?;
        let body = serde_json::json!({
            "text": format!("[{}] {}: {}", alert.level.as_str(), alert.title, alert.message),
        });
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("slack webhook request failed: {e}"))?;
        if !response.status().is_success() {
            return Err(format!("slack webhook returned status {}", response.status()));
        }
        Ok(())
    }
}
