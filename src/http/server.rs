use super::app_error::AppError;
use super::health::{liveness, status};
use super::sheets::{append_sheet, authenticate, read_sheet, sheet_info, write_sheet};
use super::state::HttpServerState;
use super::trainings::list_trainings;
use crate::config;
use anyhow::Result;
use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace;
use tower_http::{ServiceBuilderExt, trace::TraceLayer};
use tracing::{Level, error};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "Training Sheets", description = "Training Sheets API"),
        (name = "Sheets", description = "Spreadsheet authentication, reads and writes"),
        (name = "Trainings", description = "Employees and training records"),
        (name = "Health", description = "Service status"),
    ),
    paths(
        frontpage,
        super::sheets::authenticate,
        super::sheets::read_sheet,
        super::sheets::write_sheet,
        super::sheets::append_sheet,
        super::sheets::sheet_info,
        super::trainings::list_trainings,
        super::health::status,
        super::health::liveness,
    ),
)]
struct ApiDoc;

/// Routes shared by the server and the test harness.
pub fn build_app_routes(state: HttpServerState, max_body_layer: DefaultBodyLimit) -> Router {
    Router::new()
        .route("/", get(frontpage))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/authenticate", post(authenticate))
        .route("/read", post(read_sheet))
        .route("/write", post(write_sheet))
        .route("/append", post(append_sheet))
        .route("/info", post(sheet_info))
        .route("/trainings", post(list_trainings))
        .route("/status", get(status))
        .route("/health/live", get(liveness))
        .layer(max_body_layer)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Routes with the tracing and compression middleware. Requests are not
/// timed out here, remote calls are bounded by the Sheets client timeout.
pub fn build_app(state: HttpServerState, max_body_layer: DefaultBodyLimit) -> Router {
    // List of headers that shouldn't be logged
    let sensitive_headers: Arc<[_]> = vec![header::AUTHORIZATION, header::COOKIE].into();

    // Middleware creation
    let middleware = ServiceBuilder::new()
        .sensitive_request_headers(sensitive_headers.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .sensitive_response_headers(sensitive_headers)
        .compression()
        .into_inner();

    build_app_routes(state, max_body_layer).layer(middleware)
}

pub async fn run_http_server(state: HttpServerState, address: SocketAddr) -> Result<()> {
    let config = config::get()?;
    let max_body_layer = DefaultBodyLimit::max(config.parse_http_body_limit()?);

    let mut app = build_app(state, max_body_layer);
    if config.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    // Wait for the CTRL+C signal
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to install shutdown CTRL+C signal handler: {}", err);
        std::future::pending::<()>().await;
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    };
    AppError::internal_server_error(anyhow::anyhow!("Internal error: {}", details)).into_response()
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Training Sheets",
    responses(
        (status = 200, description = "Training Sheets Frontpage", body = String)
    )
)]
async fn frontpage(State(state): State<HttpServerState>) -> Result<Json<String>, AppError> {
    let name: String = (*state.name).clone();
    Ok(Json(name))
}
