use chrono::{DateTime, TimeDelta, Utc};
use intake_core::config::MAX_DELETE_BATCH_SIZE;
use intake_core::{AppError, Config};
use intake_storage::Storage;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Objects seen in the listing
    pub listed: usize,
    /// Objects at or past the TTL
    pub expired: usize,
    /// Expired objects in chunks the store accepted
    pub deleted: usize,
    /// Expired objects in chunks the store rejected; retried next sweep
    pub failed: usize,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Deletes blobs older than the retention TTL
///
/// Operates on the store alone: metadata records outlive their blobs.
pub struct RetentionSweeper {
    storage: Arc<dyn Storage>,
    ttl: TimeDelta,
    delete_batch_size: usize,
}

impl RetentionSweeper {
    pub fn new(storage: Arc<dyn Storage>, ttl: Duration, delete_batch_size: usize) -> Self {
        Self {
            storage,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            delete_batch_size: delete_batch_size.clamp(1, MAX_DELETE_BATCH_SIZE),
        }
    }

    pub fn from_config(config: &Config, storage: Arc<dyn Storage>) -> Self {
        Self::new(
            storage,
            config.retention_ttl(),
            config.sweep_delete_batch_size,
        )
    }

    /// Run `sweep` every `period`, the first time immediately.
    /// Returns a JoinHandle for graceful shutdown
    pub fn start(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(period);

            loop {
                sweep_interval.tick().await;

                match self.sweep().await {
                    Ok(report) if report.is_clean() => {
                        tracing::info!(
                            listed = report.listed,
                            deleted = report.deleted,
                            "Retention sweep completed"
                        );
                    }
                    Ok(report) => {
                        tracing::warn!(
                            listed = report.listed,
                            deleted = report.deleted,
                            failed = report.failed,
                            "Retention sweep completed with failures"
                        );
                    }
                    Err(e) => tracing::error!(error = %e, "Retention sweep failed"),
                }
            }
        })
    }

    pub async fn sweep(&self) -> Result<SweepReport, AppError> {
        self.sweep_at(Utc::now()).await
    }

    /// Sweep as if the current time were `now`
    #[tracing::instrument(skip(self), fields(ttl_secs = self.ttl.num_seconds()))]
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport, AppError> {
        let start = Instant::now();

        let objects = self
            .storage
            .list()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let expired: Vec<String> = objects
            .iter()
            .filter(|object| object.age_at(now) >= self.ttl)
            .map(|object| object.key.clone())
            .collect();

        let mut report = SweepReport {
            listed: objects.len(),
            expired: expired.len(),
            ..SweepReport::default()
        };

        if expired.is_empty() {
            tracing::debug!(listed = report.listed, "No expired objects");
            return Ok(report);
        }

        for chunk in expired.chunks(self.delete_batch_size) {
            match self.storage.delete_batch(chunk).await {
                Ok(()) => report.deleted += chunk.len(),
                Err(e) => {
                    report.failed += chunk.len();
                    tracing::error!(
                        error = %e,
                        chunk_size = chunk.len(),
                        first_key = %chunk[0],
                        "Failed to delete expired objects"
                    );
                }
            }
        }

        tracing::info!(
            listed = report.listed,
            expired = report.expired,
            deleted = report.deleted,
            failed = report.failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Expired objects swept"
        );

        Ok(report)
    }
}
