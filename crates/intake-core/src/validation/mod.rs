//! Upload validation
//!
//! Maps declared content types to the file extensions the service accepts.

pub mod extension;

pub use extension::{default_allowed_extensions, default_content_type_map, ExtensionPolicy, ExtensionRejection};
