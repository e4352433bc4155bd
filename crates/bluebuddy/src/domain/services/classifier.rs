//! Speech Turn Classifier
//!
//! Extracts hang-up intent and medication mentions from the newest turn.
//! Runs while the patient waits on the line, so it is bounded by a time
//! budget and degrades to "nothing detected" on any failure.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::domain::services::prompts;
use crate::domain::{DomainError, MedicationStatus, MedicationUpdate, Transcript};
use crate::ports::{CompletionOptions, LlmProvider, ResponseFormat};

/// Signals extracted from one speech turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedTurn {
    pub should_hang_up: bool,
    pub medication_mentioned: Option<MedicationUpdate>,
}

#[derive(Deserialize)]
struct RawClassification {
    hang_up: bool,
    #[serde(default)]
    medication: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

pub struct SpeechTurnClassifier {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl SpeechTurnClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Classify the transcript, falling back to the default on any failure
    pub async fn classify(&self, transcript: &Transcript) -> ClassifiedTurn {
        let started = Instant::now();
        match self.try_classify(transcript).await {
            Ok(turn) => {
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    hang_up = turn.should_hang_up,
                    medication = ?turn.medication_mentioned,
                    "Speech turn classified"
                );
                turn
            }
            Err(e) => {
                tracing::warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Speech turn classification skipped: {}",
                    e
                );
                ClassifiedTurn::default()
            }
        }
    }

    pub async fn try_classify(&self, transcript: &Transcript) -> Result<ClassifiedTurn, DomainError> {
        let prompt = prompts::classification_prompt(transcript);
        let options = CompletionOptions::structured(ResponseFormat::json_schema(
            prompts::CLASSIFICATION_SCHEMA_NAME,
            prompts::classification_schema(),
        ));

        let raw = tokio::time::timeout(self.timeout, self.llm.complete_prompt(&prompt, &options))
            .await
            .map_err(|_| {
                DomainError::provider(
                    self.llm.provider_name(),
                    format!("classification exceeded {:?}", self.timeout),
                )
            })??;

        parse_classification(&raw)
    }
}

/// Parse the model's JSON into a `ClassifiedTurn`.
///
/// An unrecognized status drops only the medication mention; the hang-up
/// decision still stands.
pub fn parse_classification(raw: &str) -> Result<ClassifiedTurn, DomainError> {
    let parsed: RawClassification = serde_json::from_str(raw.trim())
        .map_err(|e| DomainError::MalformedModelOutput(format!("classification: {}", e)))?;

    let medication = parsed
        .medication
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty() && !matches!(m.to_lowercase().as_str(), "none" | "n/a" | "null"));

    let medication_mentioned = match (medication, parsed.status) {
        (Some(medication), Some(status)) => match status.parse::<MedicationStatus>() {
            Ok(status) => Some(MedicationUpdate { medication, status }),
            Err(e) => {
                tracing::warn!(medication = %medication, "Ignoring medication mention: {}", e);
                None
            }
        },
        _ => None,
    };

    Ok(ClassifiedTurn {
        should_hang_up: parsed.hang_up,
        medication_mentioned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;

    fn transcript() -> Transcript {
        let mut transcript = Transcript::new();
        transcript.reset("prompt");
        transcript
            .append(crate::domain::TurnRole::User, "I took my aspirin")
            .unwrap();
        transcript
    }

    #[test]
    fn test_parse_medication_mention() {
        let turn =
            parse_classification(r#"{"hang_up": false, "medication": "aspirin", "status": "taken"}"#)
                .unwrap();
        assert!(!turn.should_hang_up);
        assert_eq!(
            turn.medication_mentioned,
            Some(MedicationUpdate {
                medication: "aspirin".to_string(),
                status: MedicationStatus::Taken,
            })
        );
    }

    #[test]
    fn test_parse_no_medication() {
        let turn =
            parse_classification(r#"{"hang_up": true, "medication": "", "status": ""}"#).unwrap();
        assert!(turn.should_hang_up);
        assert_eq!(turn.medication_mentioned, None);
    }

    #[test]
    fn test_unknown_status_keeps_hang_up() {
        let turn = parse_classification(
            r#"{"hang_up": true, "medication": "aspirin", "status": "sometimes"}"#,
        )
        .unwrap();
        assert!(turn.should_hang_up);
        assert_eq!(turn.medication_mentioned, None);
    }

    #[test]
    fn test_malformed_output_is_typed() {
        let err = parse_classification("yes, hang up").unwrap_err();
        assert!(matches!(err, DomainError::MalformedModelOutput(_)));
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_default() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.fail_classification("upstream 500");
        llm.fail_classification("upstream 500");
        let classifier = SpeechTurnClassifier::new(llm.clone(), Duration::from_secs(1));

        assert_eq!(classifier.classify(&transcript()).await, ClassifiedTurn::default());
        assert!(classifier.try_classify(&transcript()).await.is_err());
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let llm = Arc::new(ScriptedLlm::new().with_delay(Duration::from_millis(200)));
        llm.push_classification(r#"{"hang_up": true, "medication": "", "status": ""}"#);
        let classifier = SpeechTurnClassifier::new(llm, Duration::from_millis(20));

        let err = classifier.try_classify(&transcript()).await.unwrap_err();
        assert!(matches!(err, DomainError::ProviderUnavailable { .. }));
    }
}
