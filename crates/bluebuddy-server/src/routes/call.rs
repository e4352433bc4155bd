//! Call Routes - placement, live sessions and call history
//!
//! HTTP handlers that delegate to CallService.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::models::{CallLogResponse, CallSessionResponse, PlaceCallRequest, PlaceCallResponse};
use crate::AppState;

use super::error_response;

/// Place a check-in call
#[utoipa::path(
    post,
    path = "/calls",
    request_body = PlaceCallRequest,
    responses(
        (status = 200, description = "Call placed", body = PlaceCallResponse),
        (status = 400, description = "Invalid patient context"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 502, description = "Telephony provider unavailable")
    ),
    tag = "Calls"
)]
pub async fn place_call(
    State(state): State<AppState>,
    Json(payload): Json<PlaceCallRequest>,
) -> Result<Json<PlaceCallResponse>, (StatusCode, String)> {
    let placed = state
        .call_service
        .place_call(payload.into())
        .await
        .map_err(error_response)?;

    Ok(Json(placed.into()))
}

/// List in-flight call sessions
#[utoipa::path(
    get,
    path = "/calls",
    responses(
        (status = 200, description = "Live sessions", body = Vec<CallSessionResponse>),
        (status = 401, description = "Missing or invalid API key")
    ),
    tag = "Calls"
)]
pub async fn list_calls(State(state): State<AppState>) -> Json<Vec<CallSessionResponse>> {
    let sessions = state.call_service.active_sessions();
    Json(sessions.into_iter().map(Into::into).collect())
}

/// Most recent call logs for a patient
#[utoipa::path(
    get,
    path = "/patients/{patient_id}/call-logs",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Call logs, newest first", body = Vec<CallLogResponse>),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Calls"
)]
pub async fn call_logs(
    State(state): State<AppState>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<CallLogResponse>>, (StatusCode, String)> {
    let logs = state
        .call_service
        .call_history(patient_id)
        .await
        .map_err(error_response)?;

    Ok(Json(logs.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/calls", post(place_call).get(list_calls))
        .route("/patients/:patient_id/call-logs", get(call_logs))
}
