use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use intake_core::AppError;

/// A direct upload as received from the caller
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub body: Option<String>,
    pub is_base64_encoded: bool,
    pub content_type: Option<String>,
}

impl UploadRequest {
    pub fn base64(body: impl Into<String>, content_type: Option<&str>) -> Self {
        Self {
            body: Some(body.into()),
            is_base64_encoded: true,
            content_type: content_type.map(str::to_string),
        }
    }

    /// Decoded payload. Absent, empty, unflagged or undecodable bodies are all
    /// `InvalidEncoding`, as is a body that decodes to zero bytes.
    pub fn decode_body(&self) -> Result<Bytes, AppError> {
        let body = match self.body.as_deref().map(str::trim) {
            Some(body) if !body.is_empty() => body,
            _ => return Err(AppError::InvalidEncoding),
        };

        if !self.is_base64_encoded {
            return Err(AppError::InvalidEncoding);
        }

        let decoded = STANDARD.decode(body).map_err(|e| {
            tracing::debug!(error = %e, "Upload body is not valid base64");
            AppError::InvalidEncoding
        })?;

        if decoded.is_empty() {
            return Err(AppError::InvalidEncoding);
        }

        Ok(Bytes::from(decoded))
    }
}
