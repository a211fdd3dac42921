//! Notification publishing
//!
//! A notifier publishes one message to a named topic. Fan-out to subscribers
//! belongs to whatever sits behind the topic.

mod log;
mod recording;
mod webhook;

pub use log::LogNotifier;
pub use recording::{PublishedMessage, RecordingNotifier};
pub use webhook::{WebhookNotifier, WebhookNotifierConfig};

use async_trait::async_trait;
use intake_core::Config;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to serialize notification: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Notification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Notification endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid signing secret")]
    InvalidSecret,

    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, topic: &str, message: &str) -> Result<(), NotifyError>;

    /// Short name used in logs
    fn kind(&self) -> &'static str;
}

/// Webhook notifier when a URL is configured, otherwise a log-only notifier
pub fn create_notifier(config: &Config) -> Result<Arc<dyn Notifier>, NotifyError> {
    match &config.notification_webhook_url {
        Some(url) => {
            let notifier = WebhookNotifier::new(WebhookNotifierConfig {
                url: url.clone(),
                signing_secret: config.notification_webhook_secret.clone(),
                timeout: config.notification_timeout(),
            })?;
            tracing::info!(url = %url, topic = %config.notification_topic, "Webhook notifier configured");
            Ok(Arc::new(notifier))
        }
        None => {
            tracing::warn!(
                topic = %config.notification_topic,
                "NOTIFICATION_WEBHOOK_URL not set; notifications are only logged"
            );
            Ok(Arc::new(LogNotifier))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_falls_back_to_log_notifier() {
        let config = Config::default();
        let notifier = create_notifier(&config).unwrap();
        assert_eq!(notifier.kind(), "log");
    }

    #[test]
    fn test_factory_builds_webhook_notifier() {
        let config = Config {
            notification_webhook_url: Some("http://localhost:9999/hooks".to_string()),
            ..Config::default()
        };
        let notifier = create_notifier(&config).unwrap();
        assert_eq!(notifier.kind(), "webhook");
    }
}
