//! Email channel. No SMTP stack is available in this pipeline, so delivery
//! is mocked the way the teacher's notifications module mocks every
//! provider send — logged at info, with a synthetic provider message id.

use sf_domain::Alert;

use super::NotificationChannel;

pub struct EmailChannel {
    from_address: String,
}

impl EmailChannel {
    pub fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
        }
    }
}

#[async_trait::async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    fn is_available(&self) -> bool {
        !self.from_address.is_empty()
    }

    async fn send(&self, alert: &Alert) -> Result<(), String> {
        let provider_message_id = uuid::Uuid::new_v4();
        tracing::info!(
            from = %self.from_address,
            alert_id = %alert.id,
            provider_message_id = %provider_message_id,
            subject = %alert.title,
            "mock: sending alert email"
        );
        Ok(())
    }
}
