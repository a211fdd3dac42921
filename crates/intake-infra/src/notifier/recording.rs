use super::{Notifier, NotifyError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub message: String,
}

/// Keeps published messages in memory; can be told to fail
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<PublishedMessage>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, topic: &str, message: &str) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Unavailable("injected publish failure".to_string()));
        }

        self.messages
            .lock()
            .map_err(|_| NotifyError::Unavailable("recording notifier lock poisoned".to_string()))?
            .push(PublishedMessage {
                topic: topic.to_string(),
                message: message.to_string(),
            });
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "recording"
    }
}
