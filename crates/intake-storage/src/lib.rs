//! Intake Storage Library
//!
//! Blob storage capability used by the ingestion pipeline and the retention sweep.
//! It provides the [`Storage`] trait, an adapter over the `object_store` crate
//! (S3, local filesystem, in-process memory) and an [`InMemoryStorage`] double
//! with failure injection for tests.
//!
//! # Listing
//!
//! [`Storage::list`] always returns the complete listing. Backends that page
//! their results (S3 returns at most 1000 keys per request) follow continuation
//! tokens internally.

pub mod bucket;
pub mod factory;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use bucket::BucketStorage;
pub use factory::create_storage;
pub use intake_core::StorageBackend;
pub use memory::{InMemoryStorage, StorageOperation};
pub use traits::{Storage, StorageError, StorageResult};
