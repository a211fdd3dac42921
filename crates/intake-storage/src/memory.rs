//! In-memory blob storage for tests and local runs.
//!
//! Objects live in a sorted map. Listing walks the map in pages of `page_size`
//! keys, the way a paginated backend hands out continuation tokens, and
//! individual operations can be made to fail.

use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use intake_core::{ObjectHead, StoredObject};
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::Mutex;

const DEFAULT_PAGE_SIZE: usize = 1000;

/// Operations whose failure can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageOperation {
    Put,
    Head,
    List,
    Delete,
}

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Bytes,
    content_type: Option<String>,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<String, MemoryObject>,
    failing: HashSet<StorageOperation>,
    put_calls: usize,
    list_pages: usize,
    delete_calls: Vec<Vec<String>>,
}

#[derive(Debug)]
pub struct InMemoryStorage {
    inner: Mutex<Inner>,
    page_size: usize,
    max_delete_batch: Option<usize>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            page_size: DEFAULT_PAGE_SIZE,
            max_delete_batch: None,
        }
    }

    /// Page size used when walking the listing
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Reject delete calls naming more than `limit` keys
    pub fn with_max_delete_batch(mut self, limit: usize) -> Self {
        self.max_delete_batch = Some(limit);
        self
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StorageError::BackendError("in-memory storage lock poisoned".to_string()))
    }

    /// Seed an object with an explicit last-modified time
    pub fn insert_with_last_modified(
        &self,
        key: impl Into<String>,
        data: impl Into<Bytes>,
        last_modified: DateTime<Utc>,
    ) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.objects.insert(
                key.into(),
                MemoryObject {
                    data: data.into(),
                    content_type: None,
                    last_modified,
                },
            );
        }
    }

    /// Make every subsequent call of `operation` fail (or succeed again)
    pub fn set_failing(&self, operation: StorageOperation, failing: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            if failing {
                inner.failing.insert(operation);
            } else {
                inner.failing.remove(&operation);
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.objects.contains_key(key))
            .unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.objects.get(key).map(|o| o.data.clone()))
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.objects.get(key).and_then(|o| o.content_type.clone()))
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|inner| inner.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of put calls received, including failed ones
    pub fn put_calls(&self) -> usize {
        self.inner.lock().map(|inner| inner.put_calls).unwrap_or(0)
    }

    /// Number of listing pages served
    pub fn list_pages(&self) -> usize {
        self.inner.lock().map(|inner| inner.list_pages).unwrap_or(0)
    }

    /// Keys named by each delete call, in call order
    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.inner
            .lock()
            .map(|inner| inner.delete_calls.clone())
            .unwrap_or_default()
    }

    fn check(inner: &Inner, operation: StorageOperation) -> StorageResult<()> {
        if inner.failing.contains(&operation) {
            return Err(StorageError::BackendError(format!(
                "injected {:?} failure",
                operation
            )));
        }
        Ok(())
    }

    /// One listing page starting after `after`, plus the continuation key if more remain
    fn list_page(&self, after: Option<&str>) -> StorageResult<(Vec<StoredObject>, Option<String>)> {
        let mut inner = self.lock()?;
        Self::check(&inner, StorageOperation::List)?;
        inner.list_pages += 1;

        let lower = match after {
            Some(key) => Bound::Excluded(key.to_string()),
            None => Bound::Unbounded,
        };
        let mut page: Vec<StoredObject> = inner
            .objects
            .range((lower, Bound::Unbounded))
            .take(self.page_size + 1)
            .map(|(key, object)| StoredObject {
                key: key.clone(),
                last_modified: object.last_modified,
                size: object.data.len() as u64,
            })
            .collect();

        let next = if page.len() > self.page_size {
            page.truncate(self.page_size);
            page.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok((page, next))
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        let mut inner = self.lock()?;
        inner.put_calls += 1;
        Self::check(&inner, StorageOperation::Put)?;

        if key.is_empty()
            || key.starts_with('/')
            || key.split('/').any(|segment| segment == "." || segment == "..")
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        inner.objects.insert(
            key.to_string(),
            MemoryObject {
                data,
                content_type: Some(content_type.to_string()),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectHead> {
        let inner = self.lock()?;
        Self::check(&inner, StorageOperation::Head)?;

        inner
            .objects
            .get(key)
            .map(|object| ObjectHead {
                size: object.data.len() as u64,
                last_modified: object.last_modified,
                content_type: object.content_type.clone(),
            })
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn list(&self) -> StorageResult<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let (page, next) = self.list_page(after.as_deref())?;
            objects.extend(page);
            match next {
                Some(token) => after = Some(token),
                None => break,
            }
        }

        Ok(objects)
    }

    async fn delete_batch(&self, keys: &[String]) -> StorageResult<()> {
        let mut inner = self.lock()?;
        inner.delete_calls.push(keys.to_vec());
        Self::check(&inner, StorageOperation::Delete)?;

        if let Some(limit) = self.max_delete_batch {
            if keys.len() > limit {
                return Err(StorageError::DeleteFailed(format!(
                    "batch of {} keys exceeds limit of {}",
                    keys.len(),
                    limit
                )));
            }
        }

        for key in keys {
            inner.objects.remove(key);
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
