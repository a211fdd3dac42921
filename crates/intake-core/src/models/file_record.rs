use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Metadata persisted for every ingested file.
///
/// The index is partitioned by `extension` and sorted by `upload_date`. A record is
/// written exactly once, right after its blob has been stored, and is never updated
/// or removed by the retention sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub file_key: String,
    pub extension: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(serialize_with = "serialize_upload_date")]
    pub upload_date: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(
        file_key: impl Into<String>,
        extension: impl Into<String>,
        size: u64,
        content_type: Option<String>,
        upload_date: DateTime<Utc>,
    ) -> Self {
        Self {
            file_key: file_key.into(),
            extension: extension.into(),
            size,
            content_type,
            upload_date,
        }
    }

    /// Sortable ISO-8601 representation of `upload_date`, e.g. `2024-05-01T12:00:00.000Z`
    pub fn upload_date_iso(&self) -> String {
        format_upload_date(&self.upload_date)
    }

    /// Human-readable announcement published after a successful ingestion
    pub fn notification_message(&self) -> String {
        format!(
            "File uploaded:\nKey: {}\nExtension: {}\nSize: {} bytes\nUpload Date: {}",
            self.file_key,
            self.extension,
            self.size,
            self.upload_date_iso()
        )
    }
}

pub fn format_upload_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_upload_date<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_upload_date(date))
}
