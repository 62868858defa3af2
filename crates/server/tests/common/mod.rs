//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock sources injected, so the API can be exercised without network
//! access.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use gamelist_core::config::DatabaseConfig;
use gamelist_core::{testing::MockFetcher, Config, GameLibrary, SourceKind, SqliteGameStore};

/// Re-export fixtures for test convenience
pub use gamelist_core::testing::fixtures;

/// Test fixture for API testing with mock sources.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_search() {
///     let fixture = TestFixture::new();
///     fixture.hltb.add_game("Celeste", fixtures::partial(...)).await;
///
///     let response = fixture.post("/api/v1/games", json!({ "name": "Celeste" })).await;
///     assert_eq!(response.status, StatusCode::CREATED);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock HowLongToBeat source
    pub hltb: Arc<MockFetcher>,
    /// Mock Completionator source
    pub completionator: Arc<MockFetcher>,
    /// Temporary directory holding the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with empty mock sources.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let hltb = Arc::new(MockFetcher::new(SourceKind::Hltb));
        let completionator = Arc::new(MockFetcher::new(SourceKind::Completionator));

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            ..Default::default()
        };

        let store =
            Arc::new(SqliteGameStore::new(&db_path).expect("Failed to create game store"));
        let library = GameLibrary::new(store, hltb.clone(), completionator.clone());

        let state = Arc::new(gamelist_server::state::AppState::new(config, library));
        let router = gamelist_server::api::create_router(state);

        Self {
            router,
            hltb,
            completionator,
            temp_dir,
        }
    }

    /// Register a game with both mock sources.
    pub async fn add_game(
        &self,
        name: &str,
        hltb: (Option<f64>, Option<f64>, Option<f64>),
        completionator: (Option<f64>, Option<f64>, Option<f64>),
    ) {
        self.hltb
            .add_game(
                name,
                fixtures::partial(SourceKind::Hltb, name, hltb.0, hltb.1, hltb.2),
            )
            .await;
        self.completionator
            .add_game(
                name,
                fixtures::partial(
                    SourceKind::Completionator,
                    name,
                    completionator.0,
                    completionator.1,
                    completionator.2,
                ),
            )
            .await;
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
