use super::{Notifier, NotifyError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;
use std::time::{Duration, Instant};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Intake-Signature";

#[derive(Debug, Clone)]
pub struct WebhookNotifierConfig {
    pub url: String,
    pub signing_secret: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationPayload<'a> {
    topic: &'a str,
    message: &'a str,
    published_at: DateTime<Utc>,
}

/// Publishes notifications as signed JSON POSTs to a single endpoint
pub struct WebhookNotifier {
    http_client: Client,
    url: String,
    signing_secret: Option<String>,
}

impl WebhookNotifier {
    pub fn new(config: WebhookNotifierConfig) -> Result<Self, NotifyError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http_client,
            url: config.url,
            signing_secret: config.signing_secret,
        })
    }

    /// Hex HMAC-SHA256 of the request body
    pub fn sign_payload(body: &str, secret: &str) -> Result<String, NotifyError> {
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| NotifyError::InvalidSecret)?;
        mac.update(body.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[tracing::instrument(skip(self, message), fields(url = %self.url))]
    async fn publish(&self, topic: &str, message: &str) -> Result<(), NotifyError> {
        let start = Instant::now();
        let body = serde_json::to_string(&NotificationPayload {
            topic,
            message,
            published_at: Utc::now(),
        })?;

        let mut request = self
            .http_client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("User-Agent", "Intake-Notifier/1.0");

        if let Some(secret) = &self.signing_secret {
            let signature = Self::sign_payload(&body, secret)?;
            request = request.header(SIGNATURE_HEADER, format!("v1={}", signature));
        }

        let response = request.body(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("Failed to read response body"));
            tracing::warn!(
                status = status.as_u16(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Notification endpoint rejected message"
            );
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Notification delivered"
        );
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "webhook"
    }
}
