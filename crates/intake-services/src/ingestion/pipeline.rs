use super::{ObjectCreated, UploadRequest};
use chrono::Utc;
use futures::future::join_all;
use intake_core::{
    generate_file_key, AppError, Config, ErrorMetadata, ExtensionPolicy, ExtensionRejection,
    FileRecord, LogLevel,
};
use intake_db::MetadataIndex;
use intake_infra::Notifier;
use intake_storage::{Storage, StorageError};
use std::sync::Arc;
use std::time::Instant;

/// The two ways an ingestion can start
#[derive(Debug, Clone)]
pub enum Invocation {
    /// The caller hands over the payload
    Direct(UploadRequest),
    /// An object already landed in the store
    Reactive(ObjectCreated),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReceipt {
    pub file_key: String,
    pub record: FileRecord,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub policy: ExtensionPolicy,
    pub topic: String,
    /// Bucket whose events the reactive variant accepts
    pub bucket: String,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            policy: config.extension_policy(),
            topic: config.notification_topic.clone(),
            bucket: config.bucket_identifier().to_string(),
        }
    }
}

/// Validate, store, index, notify
pub struct IngestionPipeline {
    storage: Arc<dyn Storage>,
    index: Arc<dyn MetadataIndex>,
    notifier: Arc<dyn Notifier>,
    settings: PipelineSettings,
}

impl IngestionPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        index: Arc<dyn MetadataIndex>,
        notifier: Arc<dyn Notifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            storage,
            index,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn run(&self, invocation: Invocation) -> Result<IngestReceipt, AppError> {
        match invocation {
            Invocation::Direct(request) => self.ingest_upload(request).await,
            Invocation::Reactive(event) => self.process_object_created(event).await,
        }
    }

    /// Direct variant: decode, validate, store, then record and notify
    #[tracing::instrument(skip(self, request), fields(content_type = ?request.content_type))]
    pub async fn ingest_upload(&self, request: UploadRequest) -> Result<IngestReceipt, AppError> {
        let start = Instant::now();

        let data = request.decode_body()?;
        let content_type = request
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .ok_or(AppError::MissingContentType)?;

        let extension = self
            .settings
            .policy
            .resolve(Some(content_type))
            .map_err(|rejection| match rejection {
                ExtensionRejection::MissingContentType => AppError::MissingContentType,
                ExtensionRejection::Unsupported(raw) => AppError::UnsupportedContentType(raw),
            })?;

        let file_key = generate_file_key(&extension);
        let size = data.len() as u64;

        self.storage
            .put(&file_key, data, content_type)
            .await
            .map_err(|e| storage_error(&file_key, e))?;

        let record = FileRecord::new(
            file_key.clone(),
            extension,
            size,
            Some(content_type.to_string()),
            Utc::now(),
        );

        tracing::info!(
            file_key = %file_key,
            extension = %record.extension,
            size_bytes = size,
            duration_ms = start.elapsed().as_millis() as u64,
            "File stored"
        );

        self.record_and_notify(record).await
    }

    /// Reactive variant: index an object that is already in the store
    #[tracing::instrument(skip(self), fields(bucket = %event.bucket, key = %event.key))]
    pub async fn process_object_created(
        &self,
        event: ObjectCreated,
    ) -> Result<IngestReceipt, AppError> {
        if event.bucket != self.settings.bucket {
            return Err(AppError::ForeignBucket {
                bucket: event.bucket,
                expected: self.settings.bucket.clone(),
            });
        }

        let extension = self
            .settings
            .policy
            .extension_for_key(&event.key)
            .ok_or_else(|| AppError::UnsupportedExtension {
                key: event.key.clone(),
            })?;

        let head = self
            .storage
            .head(&event.key)
            .await
            .map_err(|e| storage_error(&event.key, e))?;

        let record = FileRecord::new(event.key, extension, head.size, head.content_type, Utc::now());
        self.record_and_notify(record).await
    }

    /// Process every event independently; one result per event, in order
    pub async fn process_events(
        &self,
        events: Vec<ObjectCreated>,
    ) -> Vec<Result<IngestReceipt, AppError>> {
        let results = join_all(
            events
                .into_iter()
                .map(|event| self.process_object_created(event)),
        )
        .await;

        for result in &results {
            if let Err(e) = result {
                log_failure(e);
            }
        }

        results
    }

    async fn record_and_notify(&self, record: FileRecord) -> Result<IngestReceipt, AppError> {
        // The blob stays in place when either step fails; the sweeper reclaims it.
        self.index
            .insert(&record)
            .await
            .map_err(|e| AppError::IndexWrite {
                file_key: record.file_key.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(
            file_key = %record.file_key,
            table = %self.index.table_name(),
            "File record indexed"
        );

        self.notifier
            .publish(&self.settings.topic, &record.notification_message())
            .await
            .map_err(|e| AppError::NotificationFailed {
                file_key: record.file_key.clone(),
                message: e.to_string(),
            })?;

        tracing::info!(
            file_key = %record.file_key,
            extension = %record.extension,
            size_bytes = record.size,
            notifier = self.notifier.kind(),
            "File ingested"
        );

        Ok(IngestReceipt {
            file_key: record.file_key.clone(),
            record,
        })
    }
}

fn storage_error(key: &str, err: StorageError) -> AppError {
    match err {
        StorageError::NotFound(_) => AppError::ObjectNotFound(key.to_string()),
        other => AppError::Storage(other.to_string()),
    }
}

/// Log an ingestion failure at the level its metadata asks for
pub fn log_failure(err: &AppError) {
    let file_key = err.stored_file_key().unwrap_or("-");
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(
            error = %err,
            error_type = err.error_type(),
            "Ingestion rejected"
        ),
        LogLevel::Warn => tracing::warn!(
            error = %err,
            error_type = err.error_type(),
            "Ingestion skipped"
        ),
        LogLevel::Error => tracing::error!(
            error = %err,
            error_type = err.error_type(),
            file_key = %file_key,
            "Ingestion failed"
        ),
    }
}
