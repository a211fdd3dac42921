use crate::constants::{BODY_ENCODING_HEADERS, UPLOAD_SUCCESS_MESSAGE};
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use intake_services::UploadRequest;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: &'static str,
    pub file_key: String,
}

#[tracing::instrument(skip(state, headers, body), fields(body_bytes = body.len()))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let request = upload_request(&headers, body);
    let receipt = state
        .pipeline
        .ingest_upload(request)
        .await
        .map_err(|e| HttpAppError::new(e, state.config.is_production()))?;

    Ok(Json(UploadResponse {
        message: UPLOAD_SUCCESS_MESSAGE,
        file_key: receipt.file_key,
    }))
}

fn upload_request(headers: &HeaderMap, body: Bytes) -> UploadRequest {
    let is_base64_encoded = BODY_ENCODING_HEADERS.iter().any(|name| {
        headers
            .get(*name)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("base64"))
    });

    // Non-UTF-8 bodies cannot be base64 text and end up as InvalidEncoding.
    let body = (!body.is_empty())
        .then(|| String::from_utf8(body.to_vec()).ok())
        .flatten();

    UploadRequest {
        body,
        is_base64_encoded,
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_either_encoding_header_marks_base64() {
        for name in BODY_ENCODING_HEADERS {
            let mut headers = HeaderMap::new();
            headers.insert(name, HeaderValue::from_static("Base64"));
            assert!(upload_request(&headers, Bytes::from_static(b"YQ==")).is_base64_encoded);
        }
        assert!(!upload_request(&HeaderMap::new(), Bytes::from_static(b"YQ==")).is_base64_encoded);
    }

    #[test]
    fn test_binary_body_is_dropped() {
        let request = upload_request(&HeaderMap::new(), Bytes::from_static(&[0xff, 0xfe]));
        assert!(request.body.is_none());
    }
}
