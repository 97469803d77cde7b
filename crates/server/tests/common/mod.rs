//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process
//! with a mock engine and fetcher injected, so every endpoint can be
//! exercised without ffmpeg or network access.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use clipforge_core::{
    config::StagingConfig,
    testing::{MockEngine, MockFetcher},
    Config, MediaService,
};
use clipforge_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use clipforge_core::testing::fixtures;

/// Upstream base URL the fixture is configured with.
pub const UPSTREAM: &str = "http://renderer:8000";

/// Test fixture for API testing with mock dependencies.
///
/// Provides an in-process router with fully controllable mocks for:
/// - The media engine (MockEngine)
/// - Remote sources and the upstream renderer (MockFetcher)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_trim() {
///     let fixture = TestFixture::new().await;
///     fixture.serve_upstream("abc123", b"mp4").await;
///
///     let response = fixture.post("/api/v1/trim", json!({
///         "video_job_id": "abc123",
///         "start": 10, "end": 40
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock engine - script failures, inspect steps
    pub engine: Arc<MockEngine>,
    /// Mock fetcher - serve URLs
    pub fetcher: Arc<MockFetcher>,
    /// Temporary directory holding the staging root
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Raw response, for downloads
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.staging = StagingConfig {
            root: temp_dir.path().join("staging"),
        };
        config.upstream.base_url = UPSTREAM.to_string();

        let engine = Arc::new(MockEngine::new());
        let fetcher = Arc::new(MockFetcher::new());

        let service = MediaService::new(&config, engine.clone(), fetcher.clone());
        let state = Arc::new(AppState::new(config, service));
        let router = create_router(state);

        Self {
            router,
            engine,
            fetcher,
            temp_dir,
        }
    }

    /// Serve bytes for an upstream render reference.
    pub async fn serve_upstream(&self, reference: &str, body: &[u8]) {
        self.fetcher
            .serve(&format!("{}/video/{}", UPSTREAM, reference), body.to_vec())
            .await;
    }

    pub fn staging_root(&self) -> PathBuf {
        self.temp_dir.path().join("staging")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let raw = self.send(request).await;
        TestResponse {
            status: raw.status,
            body: parse_json(&raw.bytes),
        }
    }

    /// GET returning headers and raw bytes.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
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

        let raw = self.send(request_builder.body(body).unwrap()).await;
        TestResponse {
            status: raw.status,
            body: parse_json(&raw.bytes),
        }
    }

    async fn send(&self, request: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        RawResponse {
            status,
            headers,
            bytes,
        }
    }
}

fn parse_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
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

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
