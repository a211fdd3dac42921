//! Test helpers: build AppState and router around in-memory collaborators.
//!
//! Run from workspace root: `cargo test -p intake-api`.

use axum_test::TestServer;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use intake_api::constants;
use intake_api::setup::{build_state, routes};
use intake_api::state::AppState;
use intake_core::Config;
use intake_db::InMemoryMetadataIndex;
use intake_infra::RecordingNotifier;
use intake_storage::InMemoryStorage;
use std::sync::Arc;

pub const TEST_BUCKET: &str = "uploads";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub fn encode(data: &[u8]) -> bytes::Bytes {
    bytes::Bytes::from(STANDARD.encode(data))
}

/// Test application: server plus handles on every collaborator.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub storage: Arc<InMemoryStorage>,
    pub index: Arc<InMemoryMetadataIndex>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn test_config() -> Config {
    Config {
        bucket_name: Some(TEST_BUCKET.to_string()),
        ..Config::default()
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(test_config())
}

pub fn setup_test_app_with(config: Config) -> TestApp {
    let storage = Arc::new(InMemoryStorage::new());
    let index = Arc::new(InMemoryMetadataIndex::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let state = build_state(config, storage.clone(), index.clone(), notifier.clone());
    let app = routes::setup_routes(&state.config, state.clone());
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        storage,
        index,
        notifier,
    }
}
