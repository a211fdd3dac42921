//! Domain models
//!
//! - [`FileRecord`]: metadata row written once per ingested blob
//! - [`StoredObject`] / [`ObjectHead`]: what the blob store reports about an object

pub mod file_record;
pub mod stored_object;

pub use file_record::{format_upload_date, FileRecord};
pub use stored_object::{ObjectHead, StoredObject};
