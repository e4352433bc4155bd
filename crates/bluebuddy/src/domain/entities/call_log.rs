//! CallLog - Persisted record of a finished call
//!
//! Pure domain entity without infrastructure dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::CallSummary;
use crate::domain::value_objects::{CallStatus, MedicationStatus};

/// Medication status observed during a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationUpdate {
    pub medication: String,
    pub status: MedicationStatus,
}

/// Values handed to persistence when a call ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCallLog {
    pub patient_id: i64,
    pub call_time: DateTime<Utc>,
    pub call_status: CallStatus,
    pub transcription: String,
    pub summary: String,
    pub alert: String,
    pub follow_up: String,
    pub medication_updates: Vec<MedicationUpdate>,
}

impl NewCallLog {
    /// Log for a call that reached a summary
    pub fn summarized(
        patient_id: i64,
        call_time: DateTime<Utc>,
        call_status: CallStatus,
        transcription: String,
        summary: &CallSummary,
        medication_updates: Vec<MedicationUpdate>,
    ) -> Self {
        Self {
            patient_id,
            call_time,
            call_status,
            transcription,
            summary: summary.summary.clone(),
            alert: summary.alert(),
            follow_up: summary.follow_up_topics.clone(),
            medication_updates,
        }
    }

    /// Log for a call with no exchange to summarize
    pub fn unsummarized(patient_id: i64, call_time: DateTime<Utc>, call_status: CallStatus) -> Self {
        Self {
            patient_id,
            call_time,
            call_status,
            transcription: String::new(),
            summary: String::new(),
            alert: String::new(),
            follow_up: String::new(),
            medication_updates: Vec::new(),
        }
    }
}

/// Stored call log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLog {
    pub id: i64,
    pub patient_id: i64,
    pub call_time: DateTime<Utc>,
    pub call_status: CallStatus,
    pub transcription: String,
    pub summary: String,
    pub alert: String,
    pub follow_up: String,
    pub medication_updates: Vec<MedicationUpdate>,
    pub created_at: DateTime<Utc>,
}

impl CallLog {
    pub fn from_new(id: i64, log: NewCallLog) -> Self {
        Self {
            id,
            patient_id: log.patient_id,
            call_time: log.call_time,
            call_status: log.call_status,
            transcription: log.transcription,
            summary: log.summary,
            alert: log.alert,
            follow_up: log.follow_up,
            medication_updates: log.medication_updates,
            created_at: Utc::now(),
        }
    }

    pub fn is_emergency(&self) -> bool {
        !self.alert.is_empty()
    }
}
