use super::app_error::AppError;
use super::state::HttpServerState;
use crate::parsing::training::{ParseResult, parse_training_data};
use crate::sheets::{AuthKind, Credentials};
use anyhow::anyhow;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RangeRequest {
    pub spreadsheet_id: Option<String>,
    /// A1 range, `Sheet1!A:Z` unless configured otherwise.
    pub range: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ValuesRequest {
    pub spreadsheet_id: Option<String>,
    pub range: Option<String>,
    /// Rows of cells. Strings, numbers, booleans and null are accepted.
    pub values: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SpreadsheetRequest {
    pub spreadsheet_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthenticateResponse {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AuthKind,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadResponse {
    pub message: String,
    pub raw_data: Vec<Vec<String>>,
    pub processed_data: ParseResult,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InfoResponse {
    pub message: String,
    #[schema(value_type = Object)]
    pub info: Map<String, Value>,
}

pub(crate) fn require_spreadsheet_id(spreadsheet_id: Option<String>) -> Result<String, AppError> {
    spreadsheet_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::bad_request(anyhow!("spreadsheet_id is required")))
}

fn require_values(
    spreadsheet_id: Option<String>,
    values: Option<Vec<Vec<Value>>>,
) -> Result<(String, Vec<Vec<Value>>), AppError> {
    match (spreadsheet_id.filter(|id| !id.trim().is_empty()), values) {
        (Some(spreadsheet_id), Some(values)) => Ok((spreadsheet_id, values)),
        _ => Err(AppError::bad_request(anyhow!(
            "spreadsheet_id and values are required"
        ))),
    }
}

/// Pick the credential kind from the request body.
///
/// A body whose `type` is `service_account` is the key bundle itself; a body
/// with `credentials_file` selects the installed-application flow.
fn credentials_from_body(body: Value) -> Result<Credentials, AppError> {
    if !body.as_object().is_some_and(|fields| !fields.is_empty()) {
        return Err(AppError::bad_request(anyhow!("No credentials provided")));
    }

    if body.get("type").and_then(Value::as_str) == Some("service_account") {
        return Credentials::service_account_from_json(body)
            .map_err(|err| AppError::unauthorized(anyhow!("Authentication failed: {}", err)));
    }

    if let Some(credentials_file) = body.get("credentials_file") {
        let credentials_file = credentials_file
            .as_str()
            .ok_or_else(|| AppError::bad_request(anyhow!("credentials_file must be a string")))?;
        let token_file = match body.get("token_file") {
            None | Some(Value::Null) => None,
            Some(Value::String(path)) => Some(PathBuf::from(path)),
            Some(_) => {
                return Err(AppError::bad_request(anyhow!("token_file must be a string")));
            }
        };
        return Ok(Credentials::oauth(credentials_file, token_file));
    }

    Err(AppError::bad_request(anyhow!("Invalid credentials format")))
}

/// Authenticate against the spreadsheet backend.
///
/// Replaces the current session on success.
#[utoipa::path(
    post,
    path = "/authenticate",
    tag = "Sheets",
    request_body(content = serde_json::Value, description = "Service account key bundle, or `credentials_file` with an optional `token_file`"),
    responses(
        (status = 200, description = "Authenticated", body = AuthenticateResponse),
        (status = 400, description = "Missing or invalid credentials payload", body = AppError),
        (status = 401, description = "Authentication failed", body = AppError),
    )
)]
pub async fn authenticate(
    State(state): State<HttpServerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AuthenticateResponse>, AppError> {
    let Json(body) = payload.map_err(AppError::from_json_rejection)?;
    let credentials = credentials_from_body(body)?;
    let kind = credentials.kind();

    if !state.sheets.authenticate(credentials).await {
        return Err(AppError::unauthorized(anyhow!("Authentication failed")));
    }

    Ok(Json(AuthenticateResponse {
        message: "Authentication successful".to_string(),
        kind,
    }))
}

/// Read a range and parse it as a training sheet.
#[utoipa::path(
    post,
    path = "/read",
    tag = "Sheets",
    request_body = RangeRequest,
    responses(
        (status = 200, description = "Raw and parsed data", body = ReadResponse),
        (status = 400, description = "Missing spreadsheet_id", body = AppError),
        (status = 404, description = "Empty range or failed read", body = AppError),
    )
)]
pub async fn read_sheet(
    State(state): State<HttpServerState>,
    payload: Result<Json<RangeRequest>, JsonRejection>,
) -> Result<Json<ReadResponse>, AppError> {
    let Json(request) = payload.map_err(AppError::from_json_rejection)?;
    let spreadsheet_id = require_spreadsheet_id(request.spreadsheet_id)?;
    let range = request.range.unwrap_or_else(|| state.ranges.read.clone());

    let raw_data = state.sheets.read_range(&spreadsheet_id, &range).await;
    if raw_data.is_empty() {
        return Err(AppError::not_found(anyhow!("No data found or read failed")));
    }

    let processed_data = parse_training_data(&raw_data);
    Ok(Json(ReadResponse {
        message: "Data read successfully".to_string(),
        raw_data,
        processed_data,
    }))
}

/// Overwrite a range.
#[utoipa::path(
    post,
    path = "/write",
    tag = "Sheets",
    request_body = ValuesRequest,
    responses(
        (status = 200, description = "Range written", body = MessageResponse),
        (status = 400, description = "Missing spreadsheet_id or values", body = AppError),
        (status = 500, description = "Write failed", body = AppError),
    )
)]
pub async fn write_sheet(
    State(state): State<HttpServerState>,
    payload: Result<Json<ValuesRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(request) = payload.map_err(AppError::from_json_rejection)?;
    let (spreadsheet_id, values) = require_values(request.spreadsheet_id, request.values)?;
    let range = request.range.unwrap_or_else(|| state.ranges.write.clone());

    if !state.sheets.write_range(&spreadsheet_id, &range, &values).await {
        return Err(AppError::internal_server_error(anyhow!("Failed to write data")));
    }

    Ok(Json(MessageResponse {
        message: "Data written successfully".to_string(),
    }))
}

/// Append rows after the existing data of a range.
#[utoipa::path(
    post,
    path = "/append",
    tag = "Sheets",
    request_body = ValuesRequest,
    responses(
        (status = 200, description = "Rows appended", body = MessageResponse),
        (status = 400, description = "Missing spreadsheet_id or values", body = AppError),
        (status = 500, description = "Append failed", body = AppError),
    )
)]
pub async fn append_sheet(
    State(state): State<HttpServerState>,
    payload: Result<Json<ValuesRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(request) = payload.map_err(AppError::from_json_rejection)?;
    let (spreadsheet_id, values) = require_values(request.spreadsheet_id, request.values)?;
    let range = request.range.unwrap_or_else(|| state.ranges.read.clone());

    if !state.sheets.append_range(&spreadsheet_id, &range, &values).await {
        return Err(AppError::internal_server_error(anyhow!("Failed to append data")));
    }

    Ok(Json(MessageResponse {
        message: "Data appended successfully".to_string(),
    }))
}

/// Spreadsheet metadata: title, locale, sheets and their grid sizes.
#[utoipa::path(
    post,
    path = "/info",
    tag = "Sheets",
    request_body = SpreadsheetRequest,
    responses(
        (status = 200, description = "Spreadsheet metadata", body = InfoResponse),
        (status = 400, description = "Missing spreadsheet_id", body = AppError),
        (status = 500, description = "Metadata unavailable", body = AppError),
    )
)]
pub async fn sheet_info(
    State(state): State<HttpServerState>,
    payload: Result<Json<SpreadsheetRequest>, JsonRejection>,
) -> Result<Json<InfoResponse>, AppError> {
    let Json(request) = payload.map_err(AppError::from_json_rejection)?;
    let spreadsheet_id = require_spreadsheet_id(request.spreadsheet_id)?;

    let info = state.sheets.get_info(&spreadsheet_id).await;
    if info.is_empty() {
        return Err(AppError::internal_server_error(anyhow!(
            "Failed to get spreadsheet information"
        )));
    }

    Ok(Json(InfoResponse {
        message: "Spreadsheet information retrieved successfully".to_string(),
        info,
    }))
}
