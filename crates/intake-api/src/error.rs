//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; every `AppError`
//! renders as `{ "message", "code", "recoverable", "fileKey"? }` with the status
//! from its metadata. Sensitive errors carry `details` only outside production.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use intake_core::{AppError, ErrorMetadata};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether retrying the same request may succeed
    pub recoverable: bool,
    /// Key of the blob that was stored before the failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from intake-core)
#[derive(Debug)]
pub struct HttpAppError {
    pub error: AppError,
    /// Hide details of sensitive errors
    pub is_production: bool,
}

impl HttpAppError {
    pub fn new(error: AppError, is_production: bool) -> Self {
        Self {
            error,
            is_production,
        }
    }
}

/// Without a configured environment, sensitive details stay hidden.
impl From<AppError> for HttpAppError {
    fn from(error: AppError) -> Self {
        Self::new(error, true)
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(format!("Invalid request body: {}", rejection.body_text())).into()
    }
}

/// JSON body extractor that answers with `ErrorResponse` on deserialization failure
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.error;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        intake_services::log_failure(app_error);

        let details = (!self.is_production || !app_error.is_sensitive())
            .then(|| app_error.to_string());

        let body = Json(ErrorResponse {
            message: app_error.client_message(),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            file_key: app_error.stored_file_key().map(str::to_string),
            details,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn storage_failure() -> AppError {
        AppError::Storage("connection reset by peer".to_string())
    }

    #[tokio::test]
    async fn test_client_error_status_and_body() {
        let response = HttpAppError::from(AppError::UnsupportedContentType(
            "text/plain".to_string(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["code"], "UNSUPPORTED_FILE_TYPE");
        assert_eq!(json["recoverable"], false);
        assert_eq!(json["details"], "Unsupported file type: text/plain");
    }

    #[tokio::test]
    async fn test_sensitive_details_hidden_in_production() {
        let response = HttpAppError::new(storage_failure(), true).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["message"], "Failed to upload file");
        assert_eq!(json["recoverable"], true);
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_sensitive_details_shown_outside_production() {
        let json = body_json(HttpAppError::new(storage_failure(), false).into_response()).await;
        assert_eq!(json["details"], "Storage error: connection reset by peer");
    }

    #[tokio::test]
    async fn test_partial_ingestion_carries_file_key() {
        let err = AppError::IndexWrite {
            file_key: "1_abc.pdf".to_string(),
            message: "down".to_string(),
        };
        let json = body_json(HttpAppError::new(err, true).into_response()).await;
        assert_eq!(json["fileKey"], "1_abc.pdf");
        assert_eq!(json["code"], "INDEX_WRITE_FAILED");
        assert!(json.get("details").is_none());
    }
}
