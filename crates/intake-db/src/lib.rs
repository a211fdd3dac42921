//! Metadata index for ingested files
//!
//! One [`FileRecord`](intake_core::FileRecord) is inserted per stored blob. The
//! index is partitioned by extension and sorted by upload date. Records are never
//! updated or deleted here; their lifecycle is independent of blob retention.

pub mod file_record;
pub mod memory;

pub use file_record::FileRecordRepository;
pub use memory::InMemoryMetadataIndex;

use async_trait::async_trait;
use intake_core::FileRecord;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Record cannot be stored: {0}")]
    InvalidRecord(String),

    #[error("Metadata index unavailable: {0}")]
    Unavailable(String),
}

/// Metadata index capability
#[async_trait]
pub trait MetadataIndex: Send + Sync {
    /// Insert one record. Re-inserting a record with the same file key is a no-op.
    async fn insert(&self, record: &FileRecord) -> Result<(), IndexError>;

    /// Identifier of the backing table, for logs
    fn table_name(&self) -> &str;
}
