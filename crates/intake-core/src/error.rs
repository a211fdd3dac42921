//! Error types module
//!
//! All pipeline and sweep failures are unified under [`AppError`]. Collaborator
//! crates keep their own error enums and convert into `AppError` at the pipeline
//! boundary. [`ErrorMetadata`] lets the HTTP layer render any variant without
//! knowing its details.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for events that were dropped without side effects
    Warn,
    /// Error level - for collaborator failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UNSUPPORTED_FILE_TYPE")
    fn error_code(&self) -> &'static str;

    /// Whether the caller may retry the same request
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid file or encoding")]
    InvalidEncoding,

    #[error("Content-Type header is missing")]
    MissingContentType,

    #[error("Unsupported file type: {0}")]
    UnsupportedContentType(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Stored object has no allowed extension: {key}")]
    UnsupportedExtension { key: String },

    #[error("Event for bucket {bucket} does not match configured bucket {expected}")]
    ForeignBucket { bucket: String, expected: String },

    #[error("Stored object not found: {0}")]
    ObjectNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Metadata index write failed for {file_key}: {message}")]
    IndexWrite { file_key: String, message: String },

    #[error("Notification failed for {file_key}: {message}")]
    NotificationFailed { file_key: String, message: String },

}

impl AppError {
    /// Key of the blob that was already stored when this error happened.
    ///
    /// Present for partial ingestions: the blob exists but its metadata or its
    /// notification is missing.
    pub fn stored_file_key(&self) -> Option<&str> {
        match self {
            AppError::IndexWrite { file_key, .. } | AppError::NotificationFailed { file_key, .. } => {
                Some(file_key)
            }
            _ => None,
        }
    }

    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status_code())
    }

    /// Short variant name used as a structured log field
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidEncoding => "InvalidEncoding",
            AppError::MissingContentType => "MissingContentType",
            AppError::UnsupportedContentType(_) => "UnsupportedContentType",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::UnsupportedExtension { .. } => "UnsupportedExtension",
            AppError::ForeignBucket { .. } => "ForeignBucket",
            AppError::ObjectNotFound(_) => "ObjectNotFound",
            AppError::Storage(_) => "Storage",
            AppError::IndexWrite { .. } => "IndexWrite",
            AppError::NotificationFailed { .. } => "NotificationFailed",
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::InvalidEncoding => (400, "INVALID_ENCODING", false, false, LogLevel::Debug),
        AppError::MissingContentType => {
            (400, "MISSING_CONTENT_TYPE", false, false, LogLevel::Debug)
        }
        AppError::UnsupportedContentType(_) => {
            (400, "UNSUPPORTED_FILE_TYPE", false, false, LogLevel::Debug)
        }
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, false, LogLevel::Debug),
        AppError::UnsupportedExtension { .. } => {
            (400, "UNSUPPORTED_EXTENSION", false, false, LogLevel::Warn)
        }
        AppError::ForeignBucket { .. } => (400, "FOREIGN_BUCKET", false, false, LogLevel::Warn),
        AppError::ObjectNotFound(_) => (404, "OBJECT_NOT_FOUND", false, false, LogLevel::Warn),
        AppError::Storage(_) => (500, "STORAGE_ERROR", true, true, LogLevel::Error),
        AppError::IndexWrite { .. } => (500, "INDEX_WRITE_FAILED", false, true, LogLevel::Error),
        AppError::NotificationFailed { .. } => {
            (500, "NOTIFICATION_FAILED", false, true, LogLevel::Error)
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidEncoding => {
                "Invalid file or encoding. Ensure the file is sent as base64.".to_string()
            }
            AppError::MissingContentType => "Content-Type header is required.".to_string(),
            AppError::UnsupportedContentType(content_type) => {
                format!("Unsupported file type: {}", content_type)
            }
            AppError::InvalidInput(message) => message.clone(),
            AppError::UnsupportedExtension { key } => {
                format!("Stored object {} does not have an allowed extension", key)
            }
            AppError::ForeignBucket { bucket, .. } => {
                format!("Events for bucket {} are not handled here", bucket)
            }
            AppError::ObjectNotFound(key) => format!("Stored object not found: {}", key),
            AppError::Storage(_) => "Failed to upload file".to_string(),
            AppError::IndexWrite { .. } => {
                "File stored but its metadata could not be recorded".to_string()
            }
            AppError::NotificationFailed { .. } => {
                "File stored and indexed but the upload notification could not be sent"
                    .to_string()
            }
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_content_type_message() {
        let err = AppError::UnsupportedContentType("text/plain".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "UNSUPPORTED_FILE_TYPE");
        assert_eq!(err.client_message(), "Unsupported file type: text/plain");
        assert!(err.is_client_error());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_missing_content_type_message() {
        let err = AppError::MissingContentType;
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.client_message(), "Content-Type header is required.");
    }

    #[test]
    fn test_storage_error_is_server_error() {
        let err = AppError::Storage("bucket unavailable".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert!(!err.is_client_error());
        assert_eq!(err.client_message(), "Failed to upload file");
        assert_eq!(err.stored_file_key(), None);
    }

    #[test]
    fn test_partial_failures_expose_stored_key() {
        let index = AppError::IndexWrite {
            file_key: "1_abc.png".to_string(),
            message: "throttled".to_string(),
        };
        let notify = AppError::NotificationFailed {
            file_key: "2_def.pdf".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(index.stored_file_key(), Some("1_abc.png"));
        assert_eq!(notify.stored_file_key(), Some("2_def.pdf"));
        assert_eq!(index.http_status_code(), 500);
        assert!(!index.is_recoverable());
        assert_eq!(notify.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_only_collaborator_failures_are_sensitive() {
        assert!(!AppError::InvalidEncoding.is_sensitive());
        assert!(!AppError::ObjectNotFound("1_abc.png".to_string()).is_sensitive());
        let err = AppError::Storage("connection reset".to_string());
        assert!(err.is_sensitive());
        assert_eq!(err.error_type(), "Storage");
        assert_eq!(err.to_string(), "Storage error: connection reset");
    }
}
