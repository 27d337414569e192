use super::app_error::AppError;
use super::sheets::{RangeRequest, require_spreadsheet_id};
use super::state::HttpServerState;
use crate::parsing::training::{Employee, TrainingRecord, parse_training_data};
use anyhow::anyhow;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrainingsResponse {
    pub message: String,
    pub employees: Vec<Employee>,
    pub trainings: Vec<TrainingRecord>,
    pub total_employees: usize,
    pub total_trainings: usize,
}

/// Employees and their training records, read from a training sheet.
#[utoipa::path(
    post,
    path = "/trainings",
    tag = "Trainings",
    request_body = RangeRequest,
    responses(
        (status = 200, description = "Parsed training sheet", body = TrainingsResponse),
        (status = 400, description = "Missing spreadsheet_id", body = AppError),
        (status = 404, description = "Empty range or failed read", body = AppError),
    )
)]
pub async fn list_trainings(
    State(state): State<HttpServerState>,
    payload: Result<Json<RangeRequest>, JsonRejection>,
) -> Result<Json<TrainingsResponse>, AppError> {
    let Json(request) = payload.map_err(AppError::from_json_rejection)?;
    let spreadsheet_id = require_spreadsheet_id(request.spreadsheet_id)?;
    let range = request.range.unwrap_or_else(|| state.ranges.read.clone());

    let raw_data = state.sheets.read_range(&spreadsheet_id, &range).await;
    if raw_data.is_empty() {
        return Err(AppError::not_found(anyhow!("No data found")));
    }

    let parsed = parse_training_data(&raw_data);
    debug!(
        "Parsed {} employees and {} trainings from {} rows",
        parsed.employees.len(),
        parsed.trainings.len(),
        raw_data.len()
    );

    Ok(Json(TrainingsResponse {
        message: "Training data retrieved successfully".to_string(),
        total_employees: parsed.employees.len(),
        total_trainings: parsed.trainings.len(),
        employees: parsed.employees,
        trainings: parsed.trainings,
    }))
}
