use crate::{IndexError, MetadataIndex};
use async_trait::async_trait;
use intake_core::FileRecord;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory metadata index for tests and local runs
#[derive(Debug, Default)]
pub struct InMemoryMetadataIndex {
    records: Mutex<Vec<FileRecord>>,
    failing: AtomicBool,
    insert_calls: AtomicUsize,
}

impl InMemoryMetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Records ordered by (extension, upload date), the index's partition and sort keys
    pub fn records(&self) -> Vec<FileRecord> {
        let mut records = self
            .records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default();
        records.sort_by(|a, b| {
            (a.extension.as_str(), a.upload_date).cmp(&(b.extension.as_str(), b.upload_date))
        });
        records
    }

    pub fn find(&self, file_key: &str) -> Option<FileRecord> {
        self.records
            .lock()
            .ok()
            .and_then(|records| records.iter().find(|r| r.file_key == file_key).cloned())
    }

    /// Number of insert calls received, including failed ones
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataIndex for InMemoryMetadataIndex {
    async fn insert(&self, record: &FileRecord) -> Result<(), IndexError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(IndexError::Unavailable("injected insert failure".to_string()));
        }

        let mut records = self
            .records
            .lock()
            .map_err(|_| IndexError::Unavailable("in-memory index lock poisoned".to_string()))?;

        if !records.iter().any(|r| r.file_key == record.file_key) {
            records.push(record.clone());
        }
        Ok(())
    }

    fn table_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(key: &str, ext: &str, minute: u32) -> FileRecord {
        FileRecord::new(
            key,
            ext,
            10,
            None,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_records_sorted_by_partition_then_date() {
        let index = InMemoryMetadataIndex::new();
        index.insert(&record("c.png", ".png", 5)).await.unwrap();
        index.insert(&record("a.pdf", ".pdf", 9)).await.unwrap();
        index.insert(&record("b.png", ".png", 1)).await.unwrap();

        let keys: Vec<String> = index.records().into_iter().map(|r| r.file_key).collect();
        assert_eq!(keys, vec!["a.pdf", "b.png", "c.png"]);
    }

    #[tokio::test]
    async fn test_reinsert_is_noop() {
        let index = InMemoryMetadataIndex::new();
        let r = record("a.pdf", ".pdf", 0);
        index.insert(&r).await.unwrap();
        index.insert(&r).await.unwrap();
        assert_eq!(index.records().len(), 1);
        assert_eq!(index.insert_calls(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let index = InMemoryMetadataIndex::new();
        index.set_failing(true);
        assert!(index.insert(&record("a.pdf", ".pdf", 0)).await.is_err());
        assert!(index.records().is_empty());
    }
}
