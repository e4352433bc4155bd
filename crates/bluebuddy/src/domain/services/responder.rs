//! Conversation Responder
//!
//! Produces the next assistant utterance. The patient must always hear
//! something, so every failure turns into the fixed fallback utterance.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::services::prompts::FALLBACK_UTTERANCE;
use crate::domain::{DomainError, Transcript};
use crate::ports::{CompletionOptions, LlmProvider};

/// Outcome of one response attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Model output, to be appended to the transcript and spoken
    Generated(String),
    /// Nothing usable came back; speak the fallback and leave the transcript alone
    Fallback,
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Generated(text) => text,
            Reply::Fallback => FALLBACK_UTTERANCE,
        }
    }
}

pub struct ConversationResponder {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
    options: CompletionOptions,
}

impl ConversationResponder {
    pub fn new(llm: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self {
            llm,
            timeout,
            options: CompletionOptions::default(),
        }
    }

    pub async fn respond(&self, transcript: &Transcript) -> Reply {
        match self.try_respond(transcript).await {
            Ok(text) => Reply::Generated(text),
            Err(e) => {
                tracing::warn!("Responder failed, speaking fallback: {}", e);
                Reply::Fallback
            }
        }
    }

    pub async fn try_respond(&self, transcript: &Transcript) -> Result<String, DomainError> {
        let response = tokio::time::timeout(
            self.timeout,
            self.llm.complete(transcript.turns(), &self.options),
        )
        .await
        .map_err(|_| {
            DomainError::provider(
                self.llm.provider_name(),
                format!("response exceeded {:?}", self.timeout),
            )
        })??;

        let text = response.content.trim();
        if text.is_empty() {
            return Err(DomainError::MalformedModelOutput(
                "empty assistant reply".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}
