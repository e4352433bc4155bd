//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::OpenApi;

use crate::models::{
    CallLogResponse, CallSessionResponse, MedicationUpdateResponse, PlaceCallRequest,
    PlaceCallResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Call endpoints
        super::call::place_call,
        super::call::list_calls,
        super::call::call_logs,
        // Voice callbacks
        super::voice::answer,
        super::voice::speech,
        super::voice::ended,
    ),
    components(schemas(
        PlaceCallRequest,
        PlaceCallResponse,
        CallSessionResponse,
        CallLogResponse,
        MedicationUpdateResponse,
    )),
    tags(
        (name = "Calls", description = "Check-in call placement and history"),
        (name = "Voice", description = "Twilio voice callbacks"),
    ),
    info(
        title = "BlueBuddy API",
        version = "0.1.0",
        description = "Automated wellness check-in calls"
    )
)]
pub struct ApiDoc;
