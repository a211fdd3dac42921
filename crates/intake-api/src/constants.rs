//! API constants

/// API base path prefix, including the version
pub const API_PREFIX: &str = "/api/v0";

/// Headers that mark the request body as base64 text
pub const BODY_ENCODING_HEADERS: [&str; 2] = ["content-transfer-encoding", "x-body-encoding"];

pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully!";
