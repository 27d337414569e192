mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::app_with_training_sheet;
use serde_json::Value;
use training_sheets::config;
use training_sheets::test_utils::http::TestApp;
use training_sheets::test_utils::load_configuration_for_tests;

mod health_check_tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness_endpoint() -> Result<()> {
        // Given: A running instance without any session
        let app = TestApp::unauthenticated();

        // When: We query the liveness endpoint
        let response = app.get("/health/live").await?;

        // Then: Response should be successful
        response.assert_status(StatusCode::OK);
        let health_response: Value = response.json()?;
        assert_eq!(health_response["status"], "ok");

        Ok(())
    }

    #[tokio::test]
    async fn test_status_when_unauthenticated() -> Result<()> {
        let app = TestApp::unauthenticated();

        let response = app.get("/status").await?;

        response.assert_status(StatusCode::OK);
        let status: Value = response.json()?;
        assert_eq!(status["authenticated"], false);
        assert_eq!(status["message"], "Not authenticated");

        Ok(())
    }

    #[tokio::test]
    async fn test_status_when_authenticated() -> Result<()> {
        let (app, _) = app_with_training_sheet().await;

        let response = app.get("/status").await?;

        response.assert_status(StatusCode::OK);
        let status: Value = response.json()?;
        assert_eq!(status["authenticated"], true);
        assert_eq!(status["message"], "Authenticated");

        Ok(())
    }

    #[tokio::test]
    async fn test_frontpage_and_docs() -> Result<()> {
        let app = TestApp::unauthenticated();

        let response = app.get("/").await?;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.body(), "\"Training Sheets Test\"");

        let response = app.get("/docs").await?;
        response.assert_status(StatusCode::OK);

        Ok(())
    }

    #[test]
    fn test_configuration_loads_for_tests() -> Result<()> {
        load_configuration_for_tests()?;
        load_configuration_for_tests()?;

        let config = config::get()?;
        assert!(config.parse_http_body_limit()? > 0);
        assert!(config.session_options()?.base_url.starts_with("http"));

        Ok(())
    }
}
