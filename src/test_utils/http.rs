//! HTTP testing utilities

use super::install_crypto_provider;
use crate::http::server::build_app_routes;
use crate::http::state::{DefaultRanges, HttpServerState};
use crate::sheets::{SheetsService, SheetsSession};
use anyhow::Result;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot` and `ready`

/// HTTP test client for making requests to our app
pub struct TestApp {
    app: axum::Router,
    sheets: Arc<SheetsService>,
}

impl TestApp {
    /// Create a test app without any spreadsheet session
    pub fn unauthenticated() -> Self {
        install_crypto_provider();
        let sheets = Arc::new(SheetsService::default());
        let state = HttpServerState {
            name: Arc::new("Training Sheets Test".to_string()),
            sheets: sheets.clone(),
            ranges: Arc::new(DefaultRanges::default()),
        };

        // Use the shared route builder from the main server
        // This ensures tests use the exact same routes as production
        let max_body_layer = DefaultBodyLimit::max(10 * 1024 * 1024); // 10MB for tests
        let app = build_app_routes(state, max_body_layer);

        Self { app, sheets }
    }

    /// Create a test app already holding the provided session
    pub async fn with_session(session: Arc<dyn SheetsSession>) -> Self {
        let app = Self::unauthenticated();
        app.sheets.install_session(session).await;
        app
    }

    pub fn sheets(&self) -> Arc<SheetsService> {
        self.sheets.clone()
    }

    /// Send a POST request with JSON data
    pub async fn post_json(&self, path: &str, json_data: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(json_data.to_string()))?;

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }

    /// Send a POST request without any body
    pub async fn post_empty(&self, path: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .body(Body::empty())?;

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())?;

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }
}

/// Test response wrapper
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl TestResponse {
    async fn new(response: axum::response::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default()
            .to_vec();
        let body = String::from_utf8_lossy(&body_bytes).to_string();

        Self {
            status,
            headers,
            body,
        }
    }

    /// Get response status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get response body as string
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse response body as JSON
    pub fn json<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_str(&self.body).map_err(Into::into)
    }

    /// Assert status code
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}. Body: {}",
            expected, self.status, self.body
        );
        self
    }

    /// Assert the `{"error": ...}` envelope carries the given message
    pub fn assert_error(&self, expected: &str) -> &Self {
        let body: serde_json::Value = self
            .json()
            .unwrap_or_else(|e| panic!("Response is not JSON ({}): {}", e, self.body));
        assert_eq!(
            body["error"], expected,
            "Unexpected error envelope: {}",
            self.body
        );
        self
    }
}
