//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock movie source injected, enabling end-to-end tests of the HTTP
//! API without network access.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use marquee_core::{
    testing::MockMovieSource, CatalogSync, CategoryStore, Config, DatabaseConfig, MovieSource,
    RankedList, ServerConfig, SqliteCatalog, SyncConfig, SyncScheduler, SyncTimings, TmdbConfig,
};
use marquee_server::AppState;

/// Re-export fixtures for test convenience
pub use marquee_core::testing::fixtures;

/// Test fixture for E2E testing with a mock movie source.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_popular() {
///     let fixture = TestFixture::new().await;
///     fixture.set_lists(&[1, 2], &[3]).await;
///     fixture.post_empty("/api/v1/sync").await;
///
///     let response = fixture.get("/api/v1/categories/popular").await;
///     assert_eq!(response.body["total"], 2);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock movie source - configure rankings, trailers and reviews
    pub source: Arc<MockMovieSource>,
    /// The catalog behind the router
    pub catalog: Arc<SqliteCatalog>,
    /// Background scheduler (if enabled)
    pub scheduler: Option<Arc<SyncScheduler>>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// Raw body, for non-JSON endpoints
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let source = Arc::new(MockMovieSource::new());

        let sync_config = SyncConfig {
            enabled: test_config.enable_scheduler,
            ..Default::default()
        };

        let config = Config {
            tmdb: TmdbConfig {
                api_key: "test-api-key".to_string(),
                base_url: None,
                language: "en-US".to_string(),
                timeout_secs: 30,
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            sync: sync_config.clone(),
        };

        let catalog = Arc::new(SqliteCatalog::new(&db_path).expect("Failed to create catalog"));
        let store: Arc<dyn CategoryStore> = catalog.clone();
        let movie_source: Arc<dyn MovieSource> = source.clone();

        let engine = Arc::new(CatalogSync::new(
            Arc::clone(&store),
            Arc::clone(&movie_source),
        ));

        let scheduler = if test_config.enable_scheduler {
            let mut timings = SyncTimings::from(&sync_config);
            timings.retry_interval = Duration::from_millis(50);
            let scheduler = Arc::new(SyncScheduler::new(
                Arc::clone(&engine),
                Arc::clone(&store),
                timings,
            ));
            scheduler.start();
            Some(scheduler)
        } else {
            None
        };

        let state = Arc::new(AppState::new(
            config,
            store,
            movie_source,
            engine,
            scheduler.clone(),
        ));

        let router = marquee_server::create_router(state);

        Self {
            router,
            source,
            catalog,
            scheduler,
            temp_dir,
        }
    }

    /// Configure both remote rankings with fixture records.
    pub async fn set_lists(&self, popular: &[u32], top_rated: &[u32]) {
        self.source
            .set_list(RankedList::Popular, fixtures::records(popular))
            .await;
        self.source
            .set_list(RankedList::TopRated, fixtures::records(top_rated))
            .await;
    }

    /// Configure the rankings and run a sync through the API.
    pub async fn synced(&self, popular: &[u32], top_rated: &[u32]) -> TestResponse {
        self.set_lists(popular, top_rated).await;
        let response = self.post_empty("/api/v1/sync").await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "sync failed: {}",
            response.body
        );
        response
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

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a PUT request with raw string body (for testing malformed JSON).
    pub async fn put_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("PUT")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
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

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
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

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

impl Drop for TestFixture {
    fn drop(&mut self) {
        if let Some(scheduler) = &self.scheduler {
            if scheduler.is_running() {
                scheduler.stop();
            }
        }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Start the background sync scheduler
    pub enable_scheduler: bool,
}

impl TestConfig {
    /// Create config with the scheduler running.
    pub fn with_scheduler() -> Self {
        Self {
            enable_scheduler: true,
        }
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
