use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use sentry::integrations::anyhow::capture_anyhow;
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

// Anyhow error handling with axum
// https://github.com/tokio-rs/axum/blob/d3112a40d55f123bc5e65f995e2068e245f12055/examples/anyhow-error-response/src/main.rs
#[derive(Debug, ToSchema)]
pub enum AppError {
    #[schema(example = "Failed to write data", value_type = String)]
    InternalServerError(anyhow::Error),
    #[schema(example = "spreadsheet_id is required", value_type = String)]
    BadRequest(anyhow::Error),
    #[schema(example = "Authentication failed", value_type = String)]
    Unauthorized(anyhow::Error),
    #[schema(example = "No data found", value_type = String)]
    NotFound(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InternalServerError(error) => {
                error!("Internal Server Error: {:#}", error);
                capture_anyhow(&error);
                (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
            AppError::BadRequest(error) => (StatusCode::BAD_REQUEST, error.to_string()),
            AppError::Unauthorized(error) => (StatusCode::UNAUTHORIZED, error.to_string()),
            AppError::NotFound(error) => (StatusCode::NOT_FOUND, error.to_string()),
        };
        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

impl AppError {
    pub fn bad_request(err: impl Into<anyhow::Error>) -> Self {
        Self::BadRequest(err.into())
    }

    pub fn unauthorized(err: impl Into<anyhow::Error>) -> Self {
        Self::Unauthorized(err.into())
    }

    pub fn internal_server_error(err: impl Into<anyhow::Error>) -> Self {
        Self::InternalServerError(err.into())
    }

    pub fn not_found(err: impl Into<anyhow::Error>) -> Self {
        Self::NotFound(err.into())
    }

    /// Missing, malformed or mistyped JSON bodies are client errors.
    pub fn from_json_rejection(rejection: JsonRejection) -> Self {
        Self::BadRequest(anyhow::anyhow!("Invalid request body: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_error_envelopes() {
        let (status, body) = render(AppError::bad_request(anyhow::anyhow!("spreadsheet_id is required"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "spreadsheet_id is required"}));

        let (status, _) = render(AppError::unauthorized(anyhow::anyhow!("nope"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = render(AppError::not_found(anyhow::anyhow!("nothing"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_only_internal_errors_are_reported() {
        let events = sentry::test::with_captured_events(|| {
            let _ = AppError::internal_server_error(anyhow::anyhow!("Failed to write data"))
                .into_response();
            let _ = AppError::not_found(anyhow::anyhow!("No data found")).into_response();
            let _ = AppError::bad_request(anyhow::anyhow!("spreadsheet_id is required"))
                .into_response();
        });
        assert_eq!(events.len(), 1);
        let exception = &events[0].exception.values[0];
        assert!(
            exception
                .value
                .as_deref()
                .is_some_and(|v| v.contains("Failed to write data"))
        );
    }

    #[tokio::test]
    async fn test_internal_errors_surface_their_message() {
        let error: AppError = std::io::Error::other("disk on fire").into();
        let (status, body) = render(error).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "disk on fire");
    }
}
