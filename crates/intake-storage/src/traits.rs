//! Storage abstraction trait
//!
//! This module defines the Storage trait that all blob backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use intake_core::{ObjectHead, StoredObject};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Blob storage capability
///
/// Implementations rely on the backend's per-key consistency; the core never
/// locks across calls and never checks whether a key already exists before a put.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` at `key`, tagging it with its content type
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()>;

    /// Size, last-modified time and (when the backend reports it) content type of one object
    async fn head(&self, key: &str) -> StorageResult<ObjectHead>;

    /// Every object currently stored, across all backend pages
    async fn list(&self) -> StorageResult<Vec<StoredObject>>;

    /// Delete the named keys. Keys that are already absent are not an error.
    async fn delete_batch(&self, keys: &[String]) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
