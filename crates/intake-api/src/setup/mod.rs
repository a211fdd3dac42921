//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use intake_core::Config;
use intake_db::MetadataIndex;
use intake_infra::Notifier;
use intake_services::{IngestionPipeline, PipelineSettings, RetentionSweeper};
use intake_storage::Storage;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    intake_infra::init_telemetry(&config.log_format, &config.environment)
        .context("Failed to initialize telemetry")?;

    tracing::info!(
        storage_backend = %config.storage_backend,
        bucket = %config.bucket_identifier(),
        allowed_extensions = %config.allowed_extensions.join(","),
        "Configuration loaded and validated successfully"
    );
    for warning in config.retention_warnings() {
        tracing::warn!("{}", warning);
    }

    let storage = intake_storage::create_storage(&config)
        .await
        .context("Failed to initialize storage")?;
    let index = database::setup_index(&config).await?;
    let notifier =
        intake_infra::create_notifier(&config).context("Failed to initialize notifier")?;

    let state = build_state(config, storage, index, notifier);
    let router = routes::setup_routes(&state.config, state.clone());

    Ok((state, router))
}

/// Wire the services around already-built collaborators
pub fn build_state(
    config: Config,
    storage: Arc<dyn Storage>,
    index: Arc<dyn MetadataIndex>,
    notifier: Arc<dyn Notifier>,
) -> Arc<AppState> {
    let storage_backend = storage.backend_type().to_string();
    let notifier_kind = notifier.kind();

    let pipeline = IngestionPipeline::new(
        storage.clone(),
        index,
        notifier,
        PipelineSettings::from_config(&config),
    );
    let sweeper = RetentionSweeper::from_config(&config, storage);

    Arc::new(AppState {
        config,
        pipeline: Arc::new(pipeline),
        sweeper: Arc::new(sweeper),
        storage_backend,
        notifier_kind,
    })
}
