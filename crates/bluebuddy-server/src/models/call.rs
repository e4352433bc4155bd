//! Call placement and history DTOs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use bluebuddy::{CallLog, CallSessionSnapshot, MedicationUpdate, PatientContext};

use crate::application::PlacedSession;

/// Place call request
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceCallRequest {
    pub patient_id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub phone_number: String,
    pub caregiver_number: Option<String>,
    /// Medication name -> last known status
    #[serde(default)]
    pub prescriptions: BTreeMap<String, String>,
    pub bio: Option<String>,
    /// Defaults to the follow-up topics of the patient's latest call
    pub follow_up_topics: Option<String>,
}

impl From<PlaceCallRequest> for PatientContext {
    fn from(req: PlaceCallRequest) -> Self {
        Self {
            patient_id: req.patient_id,
            first_name: req.first_name,
            last_name: req.last_name,
            phone_number: req.phone_number,
            caregiver_number: req.caregiver_number,
            prescriptions: req.prescriptions,
            bio: req.bio,
            follow_up_topics: req.follow_up_topics,
        }
    }
}

/// Place call response
#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceCallResponse {
    pub session_id: Uuid,
    pub call_sid: String,
    pub to: String,
    pub message: String,
}

impl From<PlacedSession> for PlaceCallResponse {
    fn from(placed: PlacedSession) -> Self {
        Self {
            session_id: placed.session_id,
            call_sid: placed.call_sid,
            to: placed.to,
            message: placed.message,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MedicationUpdateResponse {
    pub medication: String,
    pub status: String,
}

impl From<MedicationUpdate> for MedicationUpdateResponse {
    fn from(update: MedicationUpdate) -> Self {
        Self {
            medication: update.medication,
            status: update.status.to_string(),
        }
    }
}

/// In-flight call session
#[derive(Debug, Serialize, ToSchema)]
pub struct CallSessionResponse {
    pub session_id: Uuid,
    pub patient_id: i64,
    pub patient_name: String,
    pub phase: String,
    pub turns: usize,
    pub provider_call_sid: Option<String>,
    pub medication_updates: Vec<MedicationUpdateResponse>,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CallSessionSnapshot> for CallSessionResponse {
    fn from(snapshot: CallSessionSnapshot) -> Self {
        Self {
            session_id: snapshot.session_id,
            patient_id: snapshot.patient_id,
            patient_name: snapshot.patient_name,
            phase: snapshot.phase.to_string(),
            turns: snapshot.turns,
            provider_call_sid: snapshot.provider_call_sid,
            medication_updates: snapshot
                .medication_updates
                .into_iter()
                .map(Into::into)
                .collect(),
            placed_at: snapshot.placed_at,
            updated_at: snapshot.updated_at,
        }
    }
}

/// Persisted call log
#[derive(Debug, Serialize, ToSchema)]
pub struct CallLogResponse {
    pub id: i64,
    pub patient_id: i64,
    pub call_time: DateTime<Utc>,
    pub call_status: String,
    pub transcription: String,
    pub summary: String,
    pub alert: String,
    pub follow_up: String,
    pub medication_updates: Vec<MedicationUpdateResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<CallLog> for CallLogResponse {
    fn from(log: CallLog) -> Self {
        Self {
            id: log.id,
            patient_id: log.patient_id,
            call_time: log.call_time,
            call_status: log.call_status.to_string(),
            transcription: log.transcription,
            summary: log.summary,
            alert: log.alert,
            follow_up: log.follow_up,
            medication_updates: log.medication_updates.into_iter().map(Into::into).collect(),
            created_at: log.created_at,
        }
    }
}
