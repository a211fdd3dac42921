//! Ingestion pipeline and retention sweeper
//!
//! Both services depend only on the collaborator traits (`Storage`,
//! `MetadataIndex`, `Notifier`), injected as `Arc<dyn Trait>`.

pub mod ingestion;
pub mod retention;

pub use ingestion::{
    log_failure, IngestReceipt, IngestionPipeline, Invocation, ObjectCreated, PipelineSettings,
    S3EventNotification, UploadRequest,
};
pub use retention::{RetentionSweeper, SweepReport};
