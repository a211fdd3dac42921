mod events;
mod pipeline;
mod request;

pub use events::{ObjectCreated, S3EventNotification};
pub use pipeline::{log_failure, IngestReceipt, IngestionPipeline, Invocation, PipelineSettings};
pub use request::UploadRequest;
