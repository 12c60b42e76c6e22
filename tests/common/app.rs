//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use tilewall::models::AppConfig;
use tilewall::server::{build_router, create_app_state, AppState};
use tilewall::services::JobRegistry;

/// Test application with router and direct access to services
pub struct TestApp {
    router: axum::Router,
    pub jobs: Arc<JobRegistry>,
    pub config: Arc<AppConfig>,
}

impl TestApp {
    /// Create a test application that renders small tiles (10 DPI: 83x117 px)
    pub fn new() -> Self {
        Self::with_config(Self::fast_config())
    }

    /// Create a test application from an explicit configuration
    pub fn with_config(config: AppConfig) -> Self {
        // Create application state using shared server module
        let state = create_app_state(config);

        // Keep references for test assertions
        let jobs = state.jobs.clone();
        let config = state.config.clone();

        // Build router using shared server module (same as production)
        let router = build_router(state);

        Self {
            router,
            jobs,
            config,
        }
    }

    /// Configuration with a low DPI so jobs finish quickly
    pub fn fast_config() -> AppConfig {
        AppConfig {
            dpi: 10.0,
            thumbnail_edge: 32,
            ..AppConfig::default()
        }
    }

    /// Create a test app and return the state for custom router configuration
    pub fn create_state() -> AppState {
        create_app_state(Self::fast_config())
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a DELETE request to the given path
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(Request::delete(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with a raw image body
    pub async fn post_bytes(&self, path: &str, body: Vec<u8>) -> TestResponse {
        let request = Request::post(path)
            .header("Content-Type", "application/octet-stream")
            .body(Body::from(body))
            .unwrap();
        self.request(request).await
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Submit an image and return the job id
    pub async fn create_job(&self, query: &str, image: Vec<u8>) -> String {
        let response = self.post_bytes(&format!("/api/jobs?{query}"), image).await;
        assert_eq!(
            response.status,
            StatusCode::ACCEPTED,
            "job creation failed: {}",
            response.text()
        );
        let json: serde_json::Value = response.json();
        json["id"].as_str().unwrap().to_string()
    }

    /// Poll a job until it leaves the processing state
    pub async fn wait_for_job(&self, id: &str) -> serde_json::Value {
        for _ in 0..500 {
            let response = self.get(&format!("/api/jobs/{id}")).await;
            assert_eq!(response.status, StatusCode::OK, "{}", response.text());
            let json: serde_json::Value = response.json();
            if json["status"] != "processing" {
                return json;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} did not finish");
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get raw body bytes
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Get a header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Check if response is a PNG image
    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == b"\x89PNG\r\n\x1a\n"
    }

    /// Check if response is a PDF document
    pub fn is_pdf(&self) -> bool {
        self.body.starts_with(b"%PDF-")
    }
}
