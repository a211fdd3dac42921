//! Intake Infrastructure Library
//!
//! Outbound notification publishing and tracing setup.

pub mod notifier;
pub mod telemetry;

pub use notifier::{
    create_notifier, LogNotifier, Notifier, NotifyError, PublishedMessage, RecordingNotifier,
    WebhookNotifier, WebhookNotifierConfig,
};
pub use telemetry::init_telemetry;
