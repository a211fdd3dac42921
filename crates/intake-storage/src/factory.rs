use crate::{BucketStorage, Storage, StorageBackend, StorageError, StorageResult};
use intake_core::Config;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let bucket = config.bucket_identifier().to_string();

    match config.storage_backend {
        StorageBackend::S3 => {
            let bucket_name = config
                .bucket_name
                .clone()
                .ok_or_else(|| StorageError::ConfigError("BUCKET_NAME not configured".to_string()))?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;

            // Credentials come from the standard AWS_* environment variables.
            let mut builder = AmazonS3Builder::from_env()
                .with_region(region)
                .with_bucket_name(bucket_name);

            if let Some(ref endpoint) = config.s3_endpoint {
                let allow_http = endpoint.starts_with("http://");
                builder = builder
                    .with_endpoint(endpoint.clone())
                    .with_allow_http(allow_http);
            }

            let store = builder
                .build()
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;

            tracing::info!(bucket = %bucket, "Using S3 storage backend");
            Ok(Arc::new(BucketStorage::new(store, bucket, StorageBackend::S3)))
        }

        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;

            tokio::fs::create_dir_all(&base_path).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    base_path, e
                ))
            })?;

            let store = LocalFileSystem::new_with_prefix(&base_path)
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;

            tracing::info!(path = %base_path, "Using local filesystem storage backend");
            Ok(Arc::new(BucketStorage::new(store, bucket, StorageBackend::Local)))
        }

        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage backend; stored files are lost on restart");
            Ok(Arc::new(BucketStorage::new(
                InMemory::new(),
                bucket,
                StorageBackend::Memory,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let config = Config::default();
        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Memory);
    }

    #[tokio::test]
    async fn test_create_local_storage_creates_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("blobs");
        let config = Config {
            storage_backend: StorageBackend::Local,
            local_storage_path: Some(path.display().to_string()),
            ..Config::default()
        };

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
        storage
            .put("1_abc.pdf", Bytes::from_static(b"%PDF-1.7"), "application/pdf")
            .await
            .unwrap();
        assert!(path.join("1_abc.pdf").exists());
    }

    #[tokio::test]
    async fn test_s3_without_bucket_is_config_error() {
        let config = Config {
            storage_backend: StorageBackend::S3,
            ..Config::default()
        };
        let result = create_storage(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
