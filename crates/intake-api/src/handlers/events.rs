use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use intake_services::S3EventNotification;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct EventBatchResponse {
    /// Records in the payload
    pub received: usize,
    /// Records that were not creation events
    pub ignored: usize,
    pub ingested: usize,
    /// Events dropped without side effects (unsupported extension, foreign bucket, missing object)
    pub rejected: usize,
    /// Events that hit a collaborator failure
    pub failed: usize,
}

/// Storage "object created" notifications; processed before responding
#[tracing::instrument(skip(state, notification), fields(records = notification.records.len()))]
pub async fn object_created(
    State(state): State<Arc<AppState>>,
    ValidatedJson(notification): ValidatedJson<S3EventNotification>,
) -> Result<impl IntoResponse, HttpAppError> {
    let events = notification.object_created_events();
    let mut response = EventBatchResponse {
        received: notification.records.len(),
        ignored: notification.records.len() - events.len(),
        ..EventBatchResponse::default()
    };

    for result in state.pipeline.process_events(events).await {
        match result {
            Ok(_) => response.ingested += 1,
            Err(e) if e.is_client_error() => response.rejected += 1,
            Err(_) => response.failed += 1,
        }
    }

    Ok((StatusCode::ACCEPTED, Json(response)))
}
