use intake_core::Config;
use intake_services::{IngestionPipeline, RetentionSweeper};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<IngestionPipeline>,
    pub sweeper: Arc<RetentionSweeper>,
    /// Backend names reported by the health check
    pub storage_backend: String,
    pub notifier_kind: &'static str,
}
