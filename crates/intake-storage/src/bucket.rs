use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use intake_core::{ObjectHead, StoredObject};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, GetOptions, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};

/// Blob storage over any `object_store` backend (AmazonS3, LocalFileSystem, InMemory)
#[derive(Debug)]
pub struct BucketStorage<S> {
    store: S,
    bucket: String,
    backend: StorageBackend,
    /// LocalFileSystem rejects puts that carry attributes
    tag_content_type: bool,
}

impl<S: ObjectStore> BucketStorage<S> {
    /// Wrap an object store
    ///
    /// # Arguments
    /// * `store` - Configured object_store backend
    /// * `bucket` - Identifier used in logs and for matching storage events
    /// * `backend` - Backend kind this store represents
    pub fn new(store: S, bucket: impl Into<String>, backend: StorageBackend) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            backend,
            tag_content_type: backend != StorageBackend::Local,
        }
    }

    /// `Path::parse` rejects `.` and `..` segments; `a..b.pdf` is an ordinary key.
    fn location(key: &str) -> StorageResult<Path> {
        if key.is_empty() || key.starts_with('/') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Path::parse(key).map_err(|e| StorageError::InvalidKey(format!("{}: {}", key, e)))
    }
}

#[async_trait]
impl<S: ObjectStore> Storage for BucketStorage<S> {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        let location = Self::location(key)?;
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = if self.tag_content_type {
            let mut attributes = Attributes::new();
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
            let opts = PutOptions {
                attributes,
                ..Default::default()
            };
            self.store
                .put_opts(&location, PutPayload::from(data), opts)
                .await
        } else {
            self.store.put(&location, PutPayload::from(data)).await
        };

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object put failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            content_type = %content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object put successful"
        );

        Ok(())
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectHead> {
        let location = Self::location(key)?;

        let opts = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = self
            .store
            .get_opts(&location, opts)
            .await
            .map_err(|e| match e {
                ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
                other => StorageError::BackendError(other.to_string()),
            })?;

        Ok(ObjectHead {
            size: result.meta.size,
            last_modified: result.meta.last_modified,
            content_type: result
                .attributes
                .get(&Attribute::ContentType)
                .map(|value| value.to_string()),
        })
    }

    async fn list(&self) -> StorageResult<Vec<StoredObject>> {
        let start = std::time::Instant::now();

        // The stream follows continuation tokens until the listing is exhausted.
        let objects: Vec<StoredObject> = self
            .store
            .list(None)
            .map_ok(|meta| StoredObject {
                key: meta.location.to_string(),
                last_modified: meta.last_modified,
                size: meta.size,
            })
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, bucket = %self.bucket, "Object listing failed");
                StorageError::ListFailed(e.to_string())
            })?;

        tracing::debug!(
            bucket = %self.bucket,
            object_count = objects.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object listing complete"
        );

        Ok(objects)
    }

    async fn delete_batch(&self, keys: &[String]) -> StorageResult<()> {
        let start = std::time::Instant::now();

        // An unaddressable key is one failure; the rest of the batch is still deleted.
        let mut failures = Vec::new();
        let mut locations: Vec<ObjectResult<Path>> = Vec::with_capacity(keys.len());
        for key in keys {
            match Self::location(key) {
                Ok(location) => locations.push(Ok(location)),
                Err(e) => failures.push(e.to_string()),
            }
        }

        // S3 turns this into DeleteObjects requests of up to 1000 keys.
        let results: Vec<ObjectResult<Path>> = self
            .store
            .delete_stream(futures::stream::iter(locations).boxed())
            .collect()
            .await;

        for result in results {
            match result {
                Ok(_) | Err(ObjectStoreError::NotFound { .. }) => {}
                Err(e) => failures.push(e.to_string()),
            }
        }

        if !failures.is_empty() {
            tracing::error!(
                bucket = %self.bucket,
                requested = keys.len(),
                failed = failures.len(),
                first_failure = %failures[0],
                "Batch delete partially failed"
            );
            return Err(StorageError::DeleteFailed(format!(
                "{} of {} keys could not be deleted (first: {})",
                failures.len(),
                keys.len(),
                failures[0]
            )));
        }

        tracing::info!(
            bucket = %self.bucket,
            deleted = keys.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Batch delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::local::LocalFileSystem;
    use object_store::memory::InMemory;
    use tempfile::tempdir;

    fn memory_storage() -> BucketStorage<InMemory> {
        BucketStorage::new(InMemory::new(), "test-bucket", StorageBackend::Memory)
    }

    #[tokio::test]
    async fn test_put_head_and_list() {
        let storage = memory_storage();
        storage
            .put("1_abc.png", Bytes::from_static(b"png-bytes"), "image/png")
            .await
            .unwrap();

        let head = storage.head("1_abc.png").await.unwrap();
        assert_eq!(head.size, 9);
        assert_eq!(head.content_type.as_deref(), Some("image/png"));

        let listing = storage.list().await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].key, "1_abc.png");
        assert_eq!(listing[0].size, 9);
    }

    #[tokio::test]
    async fn test_head_missing_is_not_found() {
        let storage = memory_storage();
        let result = storage.head("missing.pdf").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_batch_tolerates_absent_keys() {
        let storage = memory_storage();
        storage
            .put("1_abc.pdf", Bytes::from_static(b"%PDF"), "application/pdf")
            .await
            .unwrap();

        storage
            .delete_batch(&["1_abc.pdf".to_string(), "never-existed.pdf".to_string()])
            .await
            .unwrap();

        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_double_dot_inside_a_name_is_a_normal_key() {
        let storage = memory_storage();
        for key in ["ok.png", "report..final.pdf"] {
            storage
                .put(key, Bytes::from_static(b"x"), "application/pdf")
                .await
                .unwrap();
        }

        assert_eq!(storage.head("report..final.pdf").await.unwrap().size, 1);

        let keys: Vec<String> = storage
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        storage.delete_batch(&keys).await.unwrap();

        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unaddressable_key_does_not_block_the_batch() {
        let storage = memory_storage();
        storage
            .put("ok.png", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap();

        let result = storage
            .delete_batch(&["../escape.png".to_string(), "ok.png".to_string()])
            .await;

        assert!(matches!(result, Err(StorageError::DeleteFailed(_))));
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_keys_rejected() {
        let storage = memory_storage();
        let result = storage
            .put("../etc/passwd", Bytes::from_static(b"x"), "image/png")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.head("/absolute.png").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_filesystem_round_trip() {
        let dir = tempdir().unwrap();
        let store = LocalFileSystem::new_with_prefix(dir.path()).unwrap();
        let storage = BucketStorage::new(store, "local", StorageBackend::Local);

        storage
            .put("2_def.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();
        let head = storage.head("2_def.jpg").await.unwrap();
        assert_eq!(head.size, 4);
        assert_eq!(head.content_type, None);

        storage
            .delete_batch(&["2_def.jpg".to_string(), "2_def.jpg".to_string()])
            .await
            .unwrap();
        assert!(storage.list().await.unwrap().is_empty());
    }
}
