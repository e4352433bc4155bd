//! CallSession - Live state of one in-progress call
//!
//! A session is created when a call is placed and dropped once its summary
//! is persisted. All mutation goes through the transition methods below,
//! which reject out-of-sequence operations with `InvalidState`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::{MedicationUpdate, PatientContext, Transcript, TurnRole};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{CallPhase, MedicationStatus};

/// Callback addresses handed to the telephony provider for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackUrls {
    pub answer: String,
    pub speech: String,
    pub ended: String,
}

impl CallbackUrls {
    pub fn for_session(base_url: &str, session_id: Uuid) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            answer: format!("{}/voice/{}/answer", base, session_id),
            speech: format!("{}/voice/{}/speech", base, session_id),
            ended: format!("{}/voice/{}/ended", base, session_id),
        }
    }
}

/// Live call state, exclusively owned by the lifecycle controller
#[derive(Debug)]
pub struct CallSession {
    id: Uuid,
    patient: PatientContext,
    transcript: Transcript,
    medication_updates: HashMap<String, MedicationStatus>,
    phase: CallPhase,
    /// Flips when the first user/assistant turn lands; the greeting plays
    /// only while it is unset.
    has_greeted: bool,
    hang_up_requested: bool,
    provider_call_sid: Option<String>,
    placed_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CallSession {
    /// New session in `Placing`, transcript reset with `system_prompt`
    pub fn new(patient: PatientContext, system_prompt: impl Into<String>) -> Self {
        let mut transcript = Transcript::new();
        transcript.reset(system_prompt);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            patient,
            transcript,
            medication_updates: HashMap::new(),
            phase: CallPhase::Placing,
            has_greeted: false,
            hang_up_requested: false,
            provider_call_sid: None,
            placed_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn patient(&self) -> &PatientContext {
        &self.patient
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    pub fn has_greeted(&self) -> bool {
        self.has_greeted
    }

    pub fn hang_up_requested(&self) -> bool {
        self.hang_up_requested
    }

    pub fn provider_call_sid(&self) -> Option<&str> {
        self.provider_call_sid.as_deref()
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Provider accepted the outbound call
    pub fn mark_ringing(&mut self, provider_call_sid: impl Into<String>) -> Result<(), DomainError> {
        self.require_phase(CallPhase::Placing, "mark ringing")?;
        self.provider_call_sid = Some(provider_call_sid.into());
        self.transition(CallPhase::Ringing);
        Ok(())
    }

    /// Answer (or re-enter listening). Returns whether the greeting should play.
    pub fn answer(&mut self) -> Result<bool, DomainError> {
        if !self.phase.can_answer() {
            return Err(self.out_of_sequence("answer"));
        }
        self.transition(CallPhase::Listening);
        Ok(!self.has_greeted)
    }

    /// Record the provider's call id if it wasn't known at placement
    pub fn observe_call_sid(&mut self, call_sid: &str) {
        match &self.provider_call_sid {
            Some(known) if known != call_sid => {
                tracing::warn!(
                    session_id = %self.id,
                    known = %known,
                    received = %call_sid,
                    "Callback call sid does not match placed call"
                );
            }
            Some(_) => {}
            None => self.provider_call_sid = Some(call_sid.to_string()),
        }
    }

    /// Start processing one recognized utterance
    pub fn begin_turn(&mut self, speech: impl Into<String>) -> Result<(), DomainError> {
        if !self.phase.can_process_speech() {
            return Err(self.out_of_sequence("process speech"));
        }
        self.transcript.append(TurnRole::User, speech)?;
        self.has_greeted = true;
        self.transition(CallPhase::Processing);
        Ok(())
    }

    /// Record a medication mention; the last status per medication wins
    pub fn record_medication(&mut self, medication: &str, status: MedicationStatus) {
        let key = medication.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        self.medication_updates.insert(key, status);
        self.updated_at = Utc::now();
    }

    /// Append the spoken assistant reply
    pub fn record_reply(&mut self, reply: impl Into<String>) -> Result<(), DomainError> {
        self.require_phase(CallPhase::Processing, "record reply")?;
        self.transcript.append(TurnRole::Assistant, reply)
    }

    /// Turn done, back to listening
    pub fn finish_turn(&mut self) -> Result<(), DomainError> {
        self.require_phase(CallPhase::Processing, "finish turn")?;
        self.transition(CallPhase::Listening);
        Ok(())
    }

    /// Patient asked to end the call during this turn
    pub fn request_hang_up(&mut self) -> Result<(), DomainError> {
        self.require_phase(CallPhase::Processing, "request hang up")?;
        self.hang_up_requested = true;
        self.transition(CallPhase::Ending);
        Ok(())
    }

    /// Provider confirmed the line closed
    pub fn begin_ending(&mut self) -> Result<(), DomainError> {
        if self.phase.is_terminal() {
            return Err(self.out_of_sequence("end call"));
        }
        self.transition(CallPhase::Ending);
        Ok(())
    }

    /// Summary persisted; clears the transcript and pending updates
    pub fn mark_ended(&mut self) -> Result<(), DomainError> {
        self.require_phase(CallPhase::Ending, "mark ended")?;
        self.transcript.clear();
        self.medication_updates.clear();
        self.transition(CallPhase::Ended);
        Ok(())
    }

    pub fn medication_status(&self, medication: &str) -> Option<MedicationStatus> {
        self.medication_updates
            .get(&medication.trim().to_lowercase())
            .copied()
    }

    /// Pending updates, sorted by medication name
    pub fn medication_updates(&self) -> Vec<MedicationUpdate> {
        let mut updates: Vec<MedicationUpdate> = self
            .medication_updates
            .iter()
            .map(|(medication, status)| MedicationUpdate {
                medication: medication.clone(),
                status: *status,
            })
            .collect();
        updates.sort_by(|a, b| a.medication.cmp(&b.medication));
        updates
    }

    pub fn snapshot(&self) -> CallSessionSnapshot {
        CallSessionSnapshot {
            session_id: self.id,
            patient_id: self.patient.patient_id,
            patient_name: self.patient.full_name(),
            phase: self.phase,
            turns: self.transcript.len(),
            provider_call_sid: self.provider_call_sid.clone(),
            medication_updates: self.medication_updates(),
            placed_at: self.placed_at,
            updated_at: self.updated_at,
        }
    }

    fn transition(&mut self, next: CallPhase) {
        tracing::debug!(session_id = %self.id, from = %self.phase, to = %next, "Call phase transition");
        self.phase = next;
        self.updated_at = Utc::now();
    }

    fn require_phase(&self, phase: CallPhase, operation: &str) -> Result<(), DomainError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(self.out_of_sequence(operation))
        }
    }

    fn out_of_sequence(&self, operation: &str) -> DomainError {
        DomainError::InvalidState(format!(
            "cannot {} call {} while {}",
            operation, self.id, self.phase
        ))
    }
}

/// Read-only view of a session for listings
#[derive(Debug, Clone, Serialize)]
pub struct CallSessionSnapshot {
    pub session_id: Uuid,
    pub patient_id: i64,
    pub patient_name: String,
    pub phase: CallPhase,
    pub turns: usize,
    pub provider_call_sid: Option<String>,
    pub medication_updates: Vec<MedicationUpdate>,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CallSession {
        let patient = PatientContext::new(7, "Jane", "Doe", "+15550100");
        let mut session = CallSession::new(patient, "system prompt");
        session.mark_ringing("CA123").unwrap();
        session
    }

    #[test]
    fn test_new_session_has_only_system_turn() {
        let patient = PatientContext::new(7, "Jane", "Doe", "+15550100");
        let session = CallSession::new(patient, "system prompt");
        assert_eq!(session.phase(), CallPhase::Placing);
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript().turns()[0].role, TurnRole::System);
    }

    #[test]
    fn test_greets_until_first_exchange() {
        let mut session = session();
        assert!(session.answer().unwrap());
        // silence: provider redirects back to answer
        assert!(session.answer().unwrap());
        session.begin_turn("hello").unwrap();
        session.record_reply("hi Jane").unwrap();
        session.finish_turn().unwrap();
        assert!(!session.answer().unwrap());
    }

    #[test]
    fn test_greeting_flag_matches_transcript_length() {
        let mut session = session();
        session.answer().unwrap();
        assert_eq!(!session.has_greeted(), session.transcript().len() == 1);
        session.begin_turn("").unwrap();
        assert_eq!(!session.has_greeted(), session.transcript().len() == 1);
    }

    #[test]
    fn test_speech_before_answer_rejected() {
        let mut session = session();
        let err = session.begin_turn("hello").unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn test_medication_last_write_wins() {
        let mut session = session();
        session.record_medication("metformin", MedicationStatus::Delayed);
        session.record_medication("Metformin ", MedicationStatus::Taken);
        assert_eq!(
            session.medication_status("metformin"),
            Some(MedicationStatus::Taken)
        );
        assert_eq!(session.medication_updates().len(), 1);
    }

    #[test]
    fn test_hang_up_then_end() {
        let mut session = session();
        session.answer().unwrap();
        session.begin_turn("please hang up").unwrap();
        session.request_hang_up().unwrap();
        assert!(session.hang_up_requested());
        assert!(session.answer().is_err());

        session.begin_ending().unwrap();
        session.mark_ended().unwrap();
        assert!(session.transcript().is_empty());
        assert!(session.begin_ending().is_err());
    }

    #[test]
    fn test_callback_urls_strip_trailing_slash() {
        let id = Uuid::nil();
        let urls = CallbackUrls::for_session("https://example.test/", id);
        assert_eq!(
            urls.answer,
            format!("https://example.test/voice/{}/answer", id)
        );
        assert!(urls.ended.ends_with("/ended"));
    }
}
