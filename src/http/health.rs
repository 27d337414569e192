use super::state::HttpServerState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub authenticated: bool,
    pub message: String,
}

/// Liveness check
///
/// Checks if the service is running.
/// This endpoint always returns 200 OK if the server is able to respond.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
        }),
    )
}

/// Authentication status
///
/// Whether a spreadsheet session is currently held.
#[utoipa::path(
    get,
    path = "/status",
    tag = "Health",
    responses(
        (status = 200, description = "Authentication status", body = StatusResponse)
    )
)]
pub async fn status(State(state): State<HttpServerState>) -> Json<StatusResponse> {
    let authenticated = state.sheets.is_authenticated().await;
    Json(StatusResponse {
        authenticated,
        message: if authenticated {
            "Authenticated".to_string()
        } else {
            "Not authenticated".to_string()
        },
    })
}
