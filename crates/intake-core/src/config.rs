//! Configuration module
//!
//! Every collaborator identifier and retention knob is read from the environment
//! so the service can run against substitute collaborators in tests and local
//! development.

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;
use crate::validation::{default_allowed_extensions, default_content_type_map, ExtensionPolicy};

const SERVER_PORT: u16 = 4000;
const DB_MAX_CONNECTIONS: u32 = 10;
const TABLE_NAME: &str = "file_records";
const NOTIFICATION_TOPIC: &str = "file-uploads";
const NOTIFICATION_TIMEOUT_SECS: u64 = 10;
const RETENTION_TTL_SECS: u64 = 30 * 60;
const SWEEP_INTERVAL_SECS: u64 = 5 * 60;
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// S3 DeleteObjects accepts at most 1000 keys per call
pub const MAX_DELETE_BATCH_SIZE: usize = 1000;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub log_format: String,
    /// Largest accepted request body (the encoded payload, not the decoded file)
    pub max_upload_bytes: usize,
    // Object store
    pub storage_backend: StorageBackend,
    pub bucket_name: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, LocalStack, etc.)
    pub local_storage_path: Option<String>,
    // Metadata index
    pub database_url: Option<String>,
    pub table_name: String,
    pub db_max_connections: u32,
    // Notifier
    pub notification_topic: String,
    pub notification_webhook_url: Option<String>,
    pub notification_webhook_secret: Option<String>,
    pub notification_timeout_secs: u64,
    // Retention
    pub retention_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub sweep_delete_batch_size: usize,
    // Validation
    pub allowed_extensions: Vec<String>,
    pub content_type_extensions: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            log_format: "pretty".to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            storage_backend: StorageBackend::Memory,
            bucket_name: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: None,
            database_url: None,
            table_name: TABLE_NAME.to_string(),
            db_max_connections: DB_MAX_CONNECTIONS,
            notification_topic: NOTIFICATION_TOPIC.to_string(),
            notification_webhook_url: None,
            notification_webhook_secret: None,
            notification_timeout_secs: NOTIFICATION_TIMEOUT_SECS,
            retention_ttl_secs: RETENTION_TTL_SECS,
            sweep_interval_secs: SWEEP_INTERVAL_SECS,
            sweep_delete_batch_size: MAX_DELETE_BATCH_SIZE,
            allowed_extensions: default_allowed_extensions(),
            content_type_extensions: default_content_type_map(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());
        let defaults = Config::default();

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::S3,
        };

        let allowed_extensions = match var("ALLOWED_EXTENSIONS") {
            Some(value) => parse_list(&value),
            None => defaults.allowed_extensions,
        };

        let content_type_extensions = match var("CONTENT_TYPE_EXTENSIONS") {
            Some(value) => parse_content_type_map(&value)?,
            None => defaults.content_type_extensions,
        };

        let config = Config {
            server_port: parse_or("PORT", var("PORT"), SERVER_PORT)?,
            environment: var("ENVIRONMENT")
                .or_else(|| var("APP_ENV"))
                .unwrap_or(defaults.environment),
            log_format: var("LOG_FORMAT")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or(defaults.log_format),
            max_upload_bytes: parse_or(
                "MAX_UPLOAD_BYTES",
                var("MAX_UPLOAD_BYTES"),
                MAX_UPLOAD_BYTES,
            )?,
            storage_backend,
            bucket_name: var("BUCKET_NAME"),
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            database_url: var("DATABASE_URL"),
            table_name: var("TABLE_NAME").unwrap_or(defaults.table_name),
            db_max_connections: parse_or(
                "DB_MAX_CONNECTIONS",
                var("DB_MAX_CONNECTIONS"),
                DB_MAX_CONNECTIONS,
            )?,
            notification_topic: var("NOTIFICATION_TOPIC").unwrap_or(defaults.notification_topic),
            notification_webhook_url: var("NOTIFICATION_WEBHOOK_URL"),
            notification_webhook_secret: var("NOTIFICATION_WEBHOOK_SECRET"),
            notification_timeout_secs: parse_or(
                "NOTIFICATION_TIMEOUT_SECS",
                var("NOTIFICATION_TIMEOUT_SECS"),
                NOTIFICATION_TIMEOUT_SECS,
            )?,
            retention_ttl_secs: parse_or(
                "RETENTION_TTL_SECS",
                var("RETENTION_TTL_SECS"),
                RETENTION_TTL_SECS,
            )?,
            sweep_interval_secs: parse_or(
                "SWEEP_INTERVAL_SECS",
                var("SWEEP_INTERVAL_SECS"),
                SWEEP_INTERVAL_SECS,
            )?,
            sweep_delete_batch_size: parse_or(
                "SWEEP_DELETE_BATCH_SIZE",
                var("SWEEP_DELETE_BATCH_SIZE"),
                MAX_DELETE_BATCH_SIZE,
            )?,
            allowed_extensions,
            content_type_extensions,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_BYTES must be greater than zero"));
        }

        if self.retention_ttl_secs == 0 {
            return Err(anyhow::anyhow!("RETENTION_TTL_SECS must be greater than zero"));
        }

        if self.sweep_interval_secs == 0 {
            return Err(anyhow::anyhow!("SWEEP_INTERVAL_SECS must be greater than zero"));
        }

        if self.sweep_delete_batch_size == 0 || self.sweep_delete_batch_size > MAX_DELETE_BATCH_SIZE
        {
            return Err(anyhow::anyhow!(
                "SWEEP_DELETE_BATCH_SIZE must be between 1 and {}",
                MAX_DELETE_BATCH_SIZE
            ));
        }

        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must name at least one extension"));
        }

        if let Some(ext) = self
            .allowed_extensions
            .iter()
            .chain(self.content_type_extensions.values())
            .find(|ext| !is_valid_extension(ext))
        {
            return Err(anyhow::anyhow!(
                "Invalid extension '{}': extensions must start with '.' followed by alphanumerics",
                ext
            ));
        }

        if !is_plain_identifier(&self.table_name) {
            return Err(anyhow::anyhow!(
                "TABLE_NAME must contain only ASCII letters, digits and underscores"
            ));
        }

        if self.notification_topic.trim().is_empty() {
            return Err(anyhow::anyhow!("NOTIFICATION_TOPIC must not be empty"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.bucket_name.is_none() {
                    return Err(anyhow::anyhow!(
                        "BUCKET_NAME must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }

    /// Settings that are valid but worth flagging at startup.
    ///
    /// TTL and sweep interval are independent knobs; an interval that is not
    /// shorter than the TTL only lets expired objects linger up to one interval.
    pub fn retention_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.sweep_interval_secs >= self.retention_ttl_secs {
            warnings.push(format!(
                "SWEEP_INTERVAL_SECS ({}) is not shorter than RETENTION_TTL_SECS ({}); expired objects may linger up to one interval",
                self.sweep_interval_secs, self.retention_ttl_secs
            ));
        }
        warnings
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    pub fn retention_ttl(&self) -> Duration {
        Duration::from_secs(self.retention_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.notification_timeout_secs)
    }

    /// Identifier reported for the object store in events and logs
    pub fn bucket_identifier(&self) -> &str {
        self.bucket_name.as_deref().unwrap_or("local")
    }

    pub fn extension_policy(&self) -> ExtensionPolicy {
        ExtensionPolicy::new(
            self.content_type_extensions.clone(),
            self.allowed_extensions.clone(),
        )
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &str,
    value: Option<String>,
    default: T,
) -> Result<T, anyhow::Error> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", name)),
        None => Ok(default),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `application/pdf=.pdf,image/png=.png` into a content type map.
pub fn parse_content_type_map(value: &str) -> Result<BTreeMap<String, String>, anyhow::Error> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (content_type, extension) = entry.split_once('=').ok_or_else(|| {
                anyhow::anyhow!(
                    "CONTENT_TYPE_EXTENSIONS entry '{}' must look like type/subtype=.ext",
                    entry
                )
            })?;
            let content_type = content_type.trim().to_lowercase();
            if !content_type.contains('/') {
                return Err(anyhow::anyhow!(
                    "CONTENT_TYPE_EXTENSIONS entry '{}' has an invalid content type",
                    entry
                ));
            }
            Ok((content_type, extension.trim().to_lowercase()))
        })
        .collect()
}

fn is_valid_extension(ext: &str) -> bool {
    ext.len() > 1
        && ext.starts_with('.')
        && ext[1..].chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_memory_backend_defaults() {
        let config = Config::from_lookup(lookup(&[("STORAGE_BACKEND", "memory")])).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.retention_ttl(), Duration::from_secs(1800));
        assert_eq!(config.sweep_delete_batch_size, 1000);
        assert_eq!(config.table_name, "file_records");
        assert_eq!(config.allowed_extensions, vec![".pdf", ".jpg", ".png"]);
        assert_eq!(
            config.content_type_extensions.get("image/png").map(String::as_str),
            Some(".png")
        );
    }

    #[test]
    fn test_s3_backend_requires_bucket_and_region() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("BUCKET_NAME"));

        let err = Config::from_lookup(lookup(&[("BUCKET_NAME", "uploads")])).unwrap_err();
        assert!(err.to_string().contains("S3_REGION"));

        let config = Config::from_lookup(lookup(&[
            ("BUCKET_NAME", "uploads"),
            ("AWS_REGION", "eu-central-1"),
        ]))
        .unwrap();
        assert_eq!(config.s3_region.as_deref(), Some("eu-central-1"));
        assert_eq!(config.bucket_identifier(), "uploads");
    }

    #[test]
    fn test_custom_mapping_and_allow_list() {
        let config = Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("ALLOWED_EXTENSIONS", ".PDF, .gif"),
            ("CONTENT_TYPE_EXTENSIONS", "application/pdf=.pdf, image/gif=.gif"),
        ]))
        .unwrap();
        let policy = config.extension_policy();
        assert_eq!(policy.resolve(Some("image/gif")).unwrap(), ".gif");
        assert!(policy.resolve(Some("image/png")).is_err());
    }

    #[test]
    fn test_malformed_mapping_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("CONTENT_TYPE_EXTENSIONS", "application/pdf:.pdf"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("CONTENT_TYPE_EXTENSIONS"));
    }

    #[test]
    fn test_extension_without_dot_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("ALLOWED_EXTENSIONS", "pdf"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("Invalid extension"));
    }

    #[test]
    fn test_retention_knobs_are_independent() {
        let config = Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("RETENTION_TTL_SECS", "600"),
            ("SWEEP_INTERVAL_SECS", "900"),
        ]))
        .unwrap();
        assert_eq!(config.retention_ttl(), Duration::from_secs(600));
        assert_eq!(config.sweep_interval(), Duration::from_secs(900));

        let warnings = config.retention_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("SWEEP_INTERVAL_SECS (900)"));
    }

    #[test]
    fn test_default_retention_knobs_raise_no_warning() {
        assert!(Config::default().retention_warnings().is_empty());
    }

    #[test]
    fn test_invalid_numbers_and_limits() {
        let err = Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("RETENTION_TTL_SECS", "thirty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("RETENTION_TTL_SECS"));

        let err = Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("SWEEP_DELETE_BATCH_SIZE", "5000"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SWEEP_DELETE_BATCH_SIZE"));

        let err = Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("TABLE_NAME", "files; DROP TABLE"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("TABLE_NAME"));
    }

    #[test]
    fn test_local_backend_requires_path() {
        let err = Config::from_lookup(lookup(&[("STORAGE_BACKEND", "local")])).unwrap_err();
        assert!(err.to_string().contains("LOCAL_STORAGE_PATH"));
    }

    #[test]
    fn test_is_production() {
        let mut config = Config::default();
        assert!(!config.is_production());
        config.environment = "Prod".to_string();
        assert!(config.is_production());
    }
}
