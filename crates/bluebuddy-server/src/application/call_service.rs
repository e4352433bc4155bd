//! Call Lifecycle Controller (Use Case)
//!
//! Places outbound check-in calls and answers the telephony provider's
//! answer/speech/ended callbacks for each live session.
//!
//! Mid-call model failures are absorbed by the classifier and responder so
//! the patient always hears something. End-of-call failures (summary,
//! persistence) are returned to the caller and the session is kept so a
//! retried ended callback can try again.
//!
//! Speech turns and call endings run on their own task. A callback request
//! dropped by the provider never leaves a session half-processed.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use bluebuddy::domain::services::prompts;
use bluebuddy::{
    CallLog, CallLogRepository, CallSession, CallSessionSnapshot, CallStatus, CallSummarizer,
    CallbackUrls, ConversationResponder, DomainError, LlmProvider, NewCallLog, OutboundCall,
    PatientContext, Reply, SpeechTurnClassifier, TelephonyProvider, VoiceScript,
};

use super::session_store::SessionStore;

/// Most call logs returned for one patient
const HISTORY_LIMIT: i64 = 100;

/// Per-deployment call behavior
#[derive(Debug, Clone)]
pub struct CallSettings {
    /// Externally reachable base URL for provider callbacks
    pub public_base_url: String,
    /// Number the call is placed from
    pub caller_id: String,
    pub voice: String,
    pub gather_timeout_secs: u32,
    pub classifier_timeout: Duration,
    pub responder_timeout: Duration,
    pub summary_timeout: Duration,
    /// Keep empty or whitespace speech as a user turn
    pub append_empty_speech: bool,
    /// Dial this number instead of the patient's (testing deployments)
    pub destination_override: Option<String>,
}

/// Result of a successful placement
#[derive(Debug, Clone)]
pub struct PlacedSession {
    pub session_id: Uuid,
    pub call_sid: String,
    pub to: String,
    pub message: String,
}

pub struct CallService {
    sessions: SessionStore,
    classifier: SpeechTurnClassifier,
    responder: ConversationResponder,
    summarizer: CallSummarizer,
    telephony: Arc<dyn TelephonyProvider>,
    call_logs: Arc<dyn CallLogRepository>,
    settings: CallSettings,
}

impl CallService {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        telephony: Arc<dyn TelephonyProvider>,
        call_logs: Arc<dyn CallLogRepository>,
        settings: CallSettings,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            classifier: SpeechTurnClassifier::new(llm.clone(), settings.classifier_timeout),
            responder: ConversationResponder::new(llm.clone(), settings.responder_timeout),
            summarizer: CallSummarizer::new(llm, settings.summary_timeout),
            telephony,
            call_logs,
            settings,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Start a check-in call for a patient
    pub async fn place_call(&self, patient: PatientContext) -> Result<PlacedSession, DomainError> {
        patient.validate()?;
        let patient = self.with_prior_follow_ups(patient).await;

        let to = self
            .settings
            .destination_override
            .clone()
            .unwrap_or_else(|| patient.phone_number.clone());
        let first_name = patient.first_name.clone();
        let system_prompt = prompts::system_prompt(&patient);

        let session = CallSession::new(patient, system_prompt);
        let session_id = session.id();
        let urls = self.callback_urls(session_id);

        // Registered before dialing so an early callback finds the session
        // and queues behind the placement.
        let handle = self.sessions.insert(session);
        let mut session = handle.lock().await;

        let outbound = OutboundCall {
            to: to.clone(),
            from: self.settings.caller_id.clone(),
            answer_url: urls.answer,
            ended_url: urls.ended,
        };

        let placed = match self.telephony.place_call(&outbound).await {
            Ok(placed) => placed,
            Err(e) => {
                self.sessions.remove(session_id);
                drop(session);
                tracing::warn!(%session_id, "Call placement failed: {}", e);
                return Err(e);
            }
        };
        session.mark_ringing(placed.call_sid.clone())?;

        tracing::info!(
            %session_id,
            call_sid = %placed.call_sid,
            provider = self.telephony.provider_name(),
            status = %placed.status,
            "Call placed"
        );

        Ok(PlacedSession {
            session_id,
            call_sid: placed.call_sid,
            message: format!("Calling {} at {}", first_name, to),
            to,
        })
    }

    /// Provider answered (or re-entered listening after a turn)
    pub async fn on_answered(
        &self,
        session_id: Uuid,
        call_sid: Option<&str>,
    ) -> Result<VoiceScript, DomainError> {
        let mut session = self.lock_session(session_id).await?;
        if let Some(sid) = call_sid {
            session.observe_call_sid(sid);
        }

        let greet = session.answer()?;
        let urls = self.callback_urls(session_id);
        let mut script = VoiceScript::new();
        if greet {
            tracing::info!(%session_id, "Greeting patient");
            script = script.say(prompts::greeting(session.patient()), self.voice());
        }

        Ok(script
            .gather_speech(self.settings.gather_timeout_secs, urls.speech)
            .redirect(urls.answer))
    }

    /// One recognized utterance from the patient
    pub async fn on_speech(
        self: &Arc<Self>,
        session_id: Uuid,
        call_sid: Option<&str>,
        speech: Option<&str>,
    ) -> Result<VoiceScript, DomainError> {
        let service = Arc::clone(self);
        let call_sid = call_sid.map(str::to_owned);
        let speech = speech.unwrap_or_default().to_owned();
        run_detached(async move {
            service
                .process_speech(session_id, call_sid.as_deref(), &speech)
                .await
        })
        .await
    }

    /// Provider confirmed the line closed: summarize, persist, drop the session
    pub async fn on_ended(
        self: &Arc<Self>,
        session_id: Uuid,
        call_sid: Option<&str>,
        provider_status: Option<&str>,
    ) -> Result<CallLog, DomainError> {
        let service = Arc::clone(self);
        let call_sid = call_sid.map(str::to_owned);
        let provider_status = provider_status.map(str::to_owned);
        run_detached(async move {
            service
                .finish_call(session_id, call_sid.as_deref(), provider_status.as_deref())
                .await
        })
        .await
    }

    /// Snapshots of every live session, oldest first. Sessions busy with a
    /// turn or an ending are left out rather than waited on.
    pub fn active_sessions(&self) -> Vec<CallSessionSnapshot> {
        let mut snapshots: Vec<_> = self
            .sessions
            .handles()
            .into_iter()
            .filter_map(|(_, handle)| handle.try_lock().ok().map(|s| s.snapshot()))
            .collect();
        snapshots.sort_by_key(|s| s.placed_at);
        snapshots
    }

    /// Most recent call logs for a patient
    pub async fn call_history(&self, patient_id: i64) -> Result<Vec<CallLog>, DomainError> {
        self.call_logs.find_by_patient(patient_id, HISTORY_LIMIT).await
    }

    /// Drop sessions idle for longer than `ttl`. Busy sessions are skipped.
    pub fn reap_stale(&self, ttl: Duration) -> usize {
        let cutoff = match chrono::Duration::from_std(ttl) {
            Ok(ttl) => chrono::Utc::now() - ttl,
            Err(_) => return 0,
        };

        let mut reaped = 0;
        for (id, handle) in self.sessions.handles() {
            let Ok(session) = handle.try_lock() else {
                continue;
            };
            // Removed under the lock so a queued callback sees it gone
            if session.updated_at() < cutoff && self.sessions.remove(id).is_some() {
                tracing::warn!(
                    session_id = %id,
                    phase = %session.phase(),
                    "Reaped abandoned call session"
                );
                reaped += 1;
            }
        }
        reaped
    }

    async fn process_speech(
        &self,
        session_id: Uuid,
        call_sid: Option<&str>,
        speech: &str,
    ) -> Result<VoiceScript, DomainError> {
        let mut session = self.lock_session(session_id).await?;
        if let Some(sid) = call_sid {
            session.observe_call_sid(sid);
        }

        let urls = self.callback_urls(session_id);
        if speech.trim().is_empty() && !self.settings.append_empty_speech {
            tracing::debug!(%session_id, "Empty speech skipped");
            return Ok(VoiceScript::new().redirect(urls.answer));
        }

        let started = Instant::now();
        session.begin_turn(speech)?;

        let classified = self.classifier.classify(session.transcript()).await;
        if let Some(update) = &classified.medication_mentioned {
            tracing::info!(
                %session_id,
                medication = %update.medication,
                status = %update.status,
                "Medication update recorded"
            );
            session.record_medication(&update.medication, update.status);
        }

        if classified.should_hang_up {
            session.request_hang_up()?;
            tracing::info!(%session_id, "Patient asked to end the call");
            return Ok(VoiceScript::new()
                .say(prompts::GOODBYE, self.voice())
                .hangup());
        }

        let reply = self.responder.respond(session.transcript()).await;
        if let Reply::Generated(text) = &reply {
            session.record_reply(text.clone())?;
        }
        session.finish_turn()?;

        tracing::info!(
            %session_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            turns = session.transcript().len(),
            fallback = matches!(reply, Reply::Fallback),
            "Speech turn processed"
        );

        Ok(VoiceScript::new()
            .say(reply.text(), self.voice())
            .redirect(urls.answer))
    }

    async fn finish_call(
        &self,
        session_id: Uuid,
        call_sid: Option<&str>,
        provider_status: Option<&str>,
    ) -> Result<CallLog, DomainError> {
        let mut session = self.lock_session(session_id).await?;
        if let Some(sid) = call_sid {
            session.observe_call_sid(sid);
        }
        session.begin_ending()?;

        let had_exchange = session.transcript().has_exchanges();
        let status = CallStatus::from_outcome(provider_status, had_exchange);
        let patient_id = session.patient().patient_id;

        let log = if had_exchange {
            let summary = self
                .summarizer
                .summarize(session.transcript())
                .await
                .map_err(|e| {
                    tracing::error!(%session_id, "Call summary failed: {}", e);
                    e
                })?;
            NewCallLog::summarized(
                patient_id,
                session.placed_at(),
                status,
                session.transcript().dialogue(),
                &summary,
                session.medication_updates(),
            )
        } else {
            NewCallLog::unsummarized(patient_id, session.placed_at(), status)
        };

        let stored = self.call_logs.create(&log).await.map_err(|e| {
            tracing::error!(%session_id, "Call log not persisted: {}", e);
            e
        })?;

        session.mark_ended()?;
        self.sessions.remove(session_id);
        drop(session);

        tracing::info!(
            %session_id,
            call_log_id = stored.id,
            status = %stored.call_status,
            emergency = stored.is_emergency(),
            "Call ended"
        );
        Ok(stored)
    }

    /// Lock a live session. A session ended or reaped while the caller
    /// queued on its lock is reported as not found.
    async fn lock_session(
        &self,
        session_id: Uuid,
    ) -> Result<OwnedMutexGuard<CallSession>, DomainError> {
        let session = self.sessions.get(session_id)?.lock_owned().await;
        if !self.sessions.contains(session_id) {
            return Err(DomainError::not_found("CallSession", session_id));
        }
        Ok(session)
    }

    fn callback_urls(&self, session_id: Uuid) -> CallbackUrls {
        CallbackUrls::for_session(&self.settings.public_base_url, session_id)
    }

    fn voice(&self) -> Option<&str> {
        Some(self.settings.voice.as_str())
    }

    async fn with_prior_follow_ups(&self, patient: PatientContext) -> PatientContext {
        if patient.follow_up_topics.is_some() {
            return patient;
        }
        match self.call_logs.latest_for_patient(patient.patient_id).await {
            Ok(Some(log)) if !log.follow_up.trim().is_empty() => {
                patient.with_follow_up_topics(log.follow_up)
            }
            Ok(_) => patient,
            Err(e) => {
                tracing::warn!(
                    patient_id = patient.patient_id,
                    "Prior follow-up topics unavailable: {}",
                    e
                );
                patient
            }
        }
    }
}

/// Drive `work` to completion on its own task, even if the awaiting
/// callback request is dropped.
async fn run_detached<T, F>(work: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(DomainError::InvalidState(format!(
            "callback task cancelled: {}",
            e
        ))),
    }
}
