//! Storage "object created" events
//!
//! Accepts the S3 bucket notification shape. Object keys arrive form-encoded
//! (`+` for spaces, percent escapes) and are decoded before use.

use serde::Deserialize;

/// One object that appeared in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCreated {
    pub bucket: String,
    pub key: String,
}

impl ObjectCreated {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Build from a key as it appears in an event payload
    pub fn from_encoded_key(bucket: impl Into<String>, encoded_key: &str) -> Self {
        Self::new(bucket, decode_event_key(encoded_key))
    }
}

fn decode_event_key(encoded: &str) -> String {
    let spaced = encoded.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::warn!(key = %encoded, error = %e, "Event key is not valid UTF-8 after decoding; using it as-is");
            spaced
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3EventNotification {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl S3EventRecord {
    /// Records without an event name are treated as creations
    pub fn is_object_created(&self) -> bool {
        self.event_name
            .as_deref()
            .map_or(true, |name| name.starts_with("ObjectCreated"))
    }
}

impl S3EventNotification {
    /// Creation events with decoded keys; other event kinds are dropped
    pub fn object_created_events(&self) -> Vec<ObjectCreated> {
        self.records
            .iter()
            .filter(|record| record.is_object_created())
            .map(|record| ObjectCreated::from_encoded_key(&record.s3.bucket.name, &record.s3.object.key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_form_decoded() {
        let event = ObjectCreated::from_encoded_key("uploads", "reports/q1+summary%282024%29.pdf");
        assert_eq!(event.key, "reports/q1 summary(2024).pdf");
        assert_eq!(event.bucket, "uploads");
    }

    #[test]
    fn test_parses_s3_notification() {
        let payload = serde_json::json!({
            "Records": [
                {
                    "eventName": "ObjectCreated:Put",
                    "s3": {
                        "bucket": { "name": "uploads" },
                        "object": { "key": "a+b.png", "size": 12 }
                    }
                },
                {
                    "eventName": "ObjectRemoved:Delete",
                    "s3": {
                        "bucket": { "name": "uploads" },
                        "object": { "key": "gone.png" }
                    }
                },
                {
                    "s3": {
                        "bucket": { "name": "uploads" },
                        "object": { "key": "c.pdf" }
                    }
                }
            ]
        });

        let notification: S3EventNotification = serde_json::from_value(payload).unwrap();
        assert_eq!(notification.records.len(), 3);
        assert_eq!(
            notification.object_created_events(),
            vec![
                ObjectCreated::new("uploads", "a b.png"),
                ObjectCreated::new("uploads", "c.pdf"),
            ]
        );
    }

    #[test]
    fn test_missing_records_is_empty() {
        let notification: S3EventNotification = serde_json::from_str("{}").unwrap();
        assert!(notification.object_created_events().is_empty());
    }
}
