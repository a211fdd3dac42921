//! Intake Core Library
//!
//! This crate provides the domain models, error types, configuration, extension
//! validation and key generation shared by every Intake component.

pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use keys::{generate_file_key, generate_file_key_at};
pub use models::{FileRecord, ObjectHead, StoredObject};
pub use storage_types::StorageBackend;
pub use validation::{ExtensionPolicy, ExtensionRejection};
