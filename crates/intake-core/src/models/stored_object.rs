use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a blob store listing.
///
/// `last_modified` is set by the store on write and is the only clock the
/// retention sweep trusts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
}

impl StoredObject {
    /// Age of the object relative to `now`. Negative if the store clock runs ahead.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.last_modified)
    }
}

/// Result of a metadata lookup on a single stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectHead {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub content_type: Option<String>,
}
