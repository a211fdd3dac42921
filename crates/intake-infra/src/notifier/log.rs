use super::{Notifier, NotifyError};
use async_trait::async_trait;

/// Writes each message to the log instead of delivering it
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, topic: &str, message: &str) -> Result<(), NotifyError> {
        tracing::info!(topic = %topic, message = %message, "Notification published");
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "log"
    }
}
