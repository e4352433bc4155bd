//! Voice Routes - Twilio call callbacks
//!
//! Answer and speech callbacks return TwiML; the ended callback returns a
//! plain acknowledgment once the call log is stored.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::post,
    Form, Router,
};
use uuid::Uuid;

use crate::adapters::Twiml;
use crate::models::VoiceCallback;
use crate::AppState;

use super::error_response;

/// Call answered, or listening re-entered
#[utoipa::path(
    post,
    path = "/voice/{session_id}/answer",
    params(("session_id" = Uuid, Path, description = "Call session ID")),
    responses(
        (status = 200, description = "TwiML greeting and speech gather", body = String, content_type = "application/xml"),
        (status = 403, description = "Invalid Twilio signature"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Callback out of sequence")
    ),
    tag = "Voice"
)]
pub async fn answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Form(callback): Form<VoiceCallback>,
) -> Result<Twiml, (StatusCode, String)> {
    let script = state
        .call_service
        .on_answered(session_id, callback.call_sid.as_deref())
        .await
        .map_err(error_response)?;

    Ok(Twiml(script))
}

/// Recognized speech for one turn
#[utoipa::path(
    post,
    path = "/voice/{session_id}/speech",
    params(("session_id" = Uuid, Path, description = "Call session ID")),
    responses(
        (status = 200, description = "TwiML reply, or goodbye and hang-up", body = String, content_type = "application/xml"),
        (status = 403, description = "Invalid Twilio signature"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Callback out of sequence")
    ),
    tag = "Voice"
)]
pub async fn speech(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Form(callback): Form<VoiceCallback>,
) -> Result<Twiml, (StatusCode, String)> {
    let script = state
        .call_service
        .on_speech(
            session_id,
            callback.call_sid.as_deref(),
            callback.speech_result.as_deref(),
        )
        .await
        .map_err(error_response)?;

    Ok(Twiml(script))
}

/// Line closed: summarize and store the call log
#[utoipa::path(
    post,
    path = "/voice/{session_id}/ended",
    params(("session_id" = Uuid, Path, description = "Call session ID")),
    responses(
        (status = 200, description = "Call log stored", body = String),
        (status = 403, description = "Invalid Twilio signature"),
        (status = 404, description = "Unknown session"),
        (status = 502, description = "Summary could not be generated"),
        (status = 500, description = "Call log could not be stored")
    ),
    tag = "Voice"
)]
pub async fn ended(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Form(callback): Form<VoiceCallback>,
) -> Result<&'static str, (StatusCode, String)> {
    finish(state, session_id, callback).await
}

pub async fn ended_query(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(callback): Query<VoiceCallback>,
) -> Result<&'static str, (StatusCode, String)> {
    finish(state, session_id, callback).await
}

async fn finish(
    state: AppState,
    session_id: Uuid,
    callback: VoiceCallback,
) -> Result<&'static str, (StatusCode, String)> {
    state
        .call_service
        .on_ended(
            session_id,
            callback.call_sid.as_deref(),
            callback.call_status.as_deref(),
        )
        .await
        .map_err(error_response)?;

    Ok("OK")
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/voice/:session_id/answer", post(answer))
        .route("/voice/:session_id/speech", post(speech))
        .route("/voice/:session_id/ended", post(ended).get(ended_query))
}
