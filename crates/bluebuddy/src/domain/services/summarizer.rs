//! Call Summarizer
//!
//! Runs once the patient is off the line, bounded by its own time budget.
//! Failures propagate: a missing summary must be visible rather than
//! silently dropped.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::services::prompts;
use crate::domain::{CallSummary, DomainError, Transcript};
use crate::ports::{CompletionOptions, LlmProvider, ResponseFormat};

pub struct CallSummarizer {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl CallSummarizer {
    pub fn new(llm: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub async fn summarize(&self, transcript: &Transcript) -> Result<CallSummary, DomainError> {
        if !transcript.has_exchanges() {
            return Err(DomainError::InvalidState(
                "nothing to summarize before the first exchange".to_string(),
            ));
        }

        let prompt = prompts::summary_prompt(transcript);
        let options = CompletionOptions::structured(ResponseFormat::json_schema(
            prompts::SUMMARY_SCHEMA_NAME,
            prompts::summary_schema(),
        ));
        let raw = tokio::time::timeout(self.timeout, self.llm.complete_prompt(&prompt, &options))
            .await
            .map_err(|_| {
                DomainError::provider(
                    self.llm.provider_name(),
                    format!("summary exceeded {:?}", self.timeout),
                )
            })??;

        let summary: CallSummary = serde_json::from_str(raw.trim())
            .map_err(|e| DomainError::MalformedModelOutput(format!("call summary: {}", e)))?;

        tracing::info!(
            emergency = summary.is_emergency,
            follow_up_topics = %summary.follow_up_topics,
            "Call summarized"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TurnRole;
    use crate::testing::ScriptedLlm;

    const BUDGET: Duration = Duration::from_secs(2);

    fn transcript() -> Transcript {
        let mut transcript = Transcript::new();
        transcript.reset("prompt");
        transcript.append(TurnRole::User, "I fell yesterday").unwrap();
        transcript
    }

    #[tokio::test]
    async fn test_summary_parsed() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_summary(
            r#"{"summary": "Patient fell", "follow_up_topics": "fall, bruising", "is_emergency": true}"#,
        );
        let summary = CallSummarizer::new(llm, BUDGET).summarize(&transcript()).await.unwrap();

        assert!(summary.is_emergency);
        assert_eq!(summary.topics(), vec!["fall", "bruising"]);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.fail_summary("quota exceeded");
        let err = CallSummarizer::new(llm, BUDGET).summarize(&transcript()).await.unwrap_err();
        assert!(matches!(err, DomainError::ProviderUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_malformed_summary_propagates() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_summary("The patient is fine.");
        let err = CallSummarizer::new(llm, BUDGET).summarize(&transcript()).await.unwrap_err();
        assert!(matches!(err, DomainError::MalformedModelOutput(_)));
    }

    #[tokio::test]
    async fn test_refuses_system_only_transcript() {
        let llm = Arc::new(ScriptedLlm::new());
        let mut empty = Transcript::new();
        empty.reset("prompt");
        let err = CallSummarizer::new(llm.clone(), BUDGET).summarize(&empty).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(llm.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_slow_summary_times_out() {
        let llm = Arc::new(ScriptedLlm::new().with_delay(Duration::from_millis(200)));
        llm.push_summary(r#"{"summary": "ok", "follow_up_topics": "", "is_emergency": false}"#);

        let err = CallSummarizer::new(llm, Duration::from_millis(20))
            .summarize(&transcript())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ProviderUnavailable { .. }));
    }
}
