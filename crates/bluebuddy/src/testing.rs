//! Scripted port implementations for deterministic tests.
//!
//! `ScriptedLlm` answers from per-purpose FIFO queues, telling classifier,
//! summarizer and responder requests apart by the requested response
//! format. When a queue is empty a benign default is returned.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::services::prompts::{CLASSIFICATION_SCHEMA_NAME, SUMMARY_SCHEMA_NAME};
use crate::domain::{CallLog, DomainError, NewCallLog, Turn};
use crate::ports::{
    CallLogRepository, CompletionOptions, CompletionResponse, LlmProvider, OutboundCall,
    PlacedCall, TelephonyProvider, TokenUsage,
};

const DEFAULT_CLASSIFICATION: &str = r#"{"hang_up": false, "medication": "", "status": ""}"#;
const DEFAULT_REPLY: &str = "mock reply";
const DEFAULT_SUMMARY: &str =
    r#"{"summary": "mock summary", "follow_up_topics": "", "is_emergency": false}"#;

/// Which helper issued a completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Classification,
    Reply,
    Summary,
}

impl CompletionKind {
    fn of(options: &CompletionOptions) -> Self {
        match options.response_format.schema_name() {
            Some(CLASSIFICATION_SCHEMA_NAME) => CompletionKind::Classification,
            Some(SUMMARY_SCHEMA_NAME) => CompletionKind::Summary,
            _ => CompletionKind::Reply,
        }
    }
}

enum Scripted {
    Ok(String),
    Fail(String),
}

/// Mock language model with scripted responses
#[derive(Default)]
pub struct ScriptedLlm {
    classifications: Mutex<VecDeque<Scripted>>,
    replies: Mutex<VecDeque<Scripted>>,
    summaries: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(CompletionKind, Vec<Turn>)>>,
    delay: Option<Duration>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before every response (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_classification(&self, json: &str) {
        push(&self.classifications, Scripted::Ok(json.to_string()));
    }

    pub fn fail_classification(&self, message: &str) {
        push(&self.classifications, Scripted::Fail(message.to_string()));
    }

    pub fn push_reply(&self, text: &str) {
        push(&self.replies, Scripted::Ok(text.to_string()));
    }

    pub fn fail_reply(&self, message: &str) {
        push(&self.replies, Scripted::Fail(message.to_string()));
    }

    pub fn push_summary(&self, json: &str) {
        push(&self.summaries, Scripted::Ok(json.to_string()));
    }

    pub fn fail_summary(&self, message: &str) {
        push(&self.summaries, Scripted::Fail(message.to_string()));
    }

    pub fn calls(&self, kind: CompletionKind) -> usize {
        lock(&self.calls).iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn total_calls(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Messages of the most recent request
    pub fn last_messages(&self) -> Vec<Turn> {
        lock(&self.calls)
            .last()
            .map(|(_, messages)| messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(
        &self,
        messages: &[Turn],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, DomainError> {
        let kind = CompletionKind::of(options);
        lock(&self.calls).push((kind, messages.to_vec()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let (queue, default) = match kind {
            CompletionKind::Classification => (&self.classifications, DEFAULT_CLASSIFICATION),
            CompletionKind::Reply => (&self.replies, DEFAULT_REPLY),
            CompletionKind::Summary => (&self.summaries, DEFAULT_SUMMARY),
        };
        let next = lock(queue).pop_front();

        match next {
            Some(Scripted::Fail(message)) => Err(DomainError::provider("scripted", message)),
            Some(Scripted::Ok(content)) => Ok(response(content)),
            None => Ok(response(default.to_string())),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }
}

/// Telephony mock that records every placement
#[derive(Default)]
pub struct RecordingTelephony {
    placed: Mutex<Vec<OutboundCall>>,
    fail_next: AtomicBool,
    counter: AtomicUsize,
}

impl RecordingTelephony {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next placement with `ProviderUnavailable`
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn placed(&self) -> Vec<OutboundCall> {
        lock(&self.placed).clone()
    }
}

#[async_trait]
impl TelephonyProvider for RecordingTelephony {
    async fn place_call(&self, call: &OutboundCall) -> Result<PlacedCall, DomainError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(DomainError::provider("recording", "line busy"));
        }
        lock(&self.placed).push(call.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PlacedCall {
            call_sid: format!("CA{:032}", n),
            status: "queued".to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        "recording"
    }
}

/// Call log repository kept in memory
#[derive(Default)]
pub struct InMemoryCallLogRepository {
    logs: Mutex<Vec<CallLog>>,
    fail_writes: AtomicBool,
}

impl InMemoryCallLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn logs(&self) -> Vec<CallLog> {
        lock(&self.logs).clone()
    }
}

#[async_trait]
impl CallLogRepository for InMemoryCallLogRepository {
    async fn create(&self, log: &NewCallLog) -> Result<CallLog, DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::Repository("database unavailable".to_string()));
        }
        let mut logs = lock(&self.logs);
        let stored = CallLog::from_new(logs.len() as i64 + 1, log.clone());
        logs.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_patient(
        &self,
        patient_id: i64,
        limit: i64,
    ) -> Result<Vec<CallLog>, DomainError> {
        Ok(lock(&self.logs)
            .iter()
            .rev()
            .filter(|log| log.patient_id == patient_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

fn response(content: String) -> CompletionResponse {
    CompletionResponse {
        content,
        model: "scripted-model".to_string(),
        usage: TokenUsage::default(),
        finish_reason: Some("stop".to_string()),
    }
}

fn push(queue: &Mutex<VecDeque<Scripted>>, item: Scripted) {
    lock(queue).push_back(item);
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
