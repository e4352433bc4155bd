//! Transcript - Ordered turns of one call
//!
//! Exactly one `system` turn, inserted first by `reset`. Every later turn
//! is a `user` or `assistant` turn appended in call order.

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Speaker of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnRole::System => write!(f, "system"),
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One utterance in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only conversation transcript
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "StoredTranscript")]
pub struct Transcript {
    turns: Vec<Turn>,
}

#[derive(Deserialize)]
struct StoredTranscript {
    turns: Vec<Turn>,
}

impl TryFrom<StoredTranscript> for Transcript {
    type Error = DomainError;

    fn try_from(stored: StoredTranscript) -> Result<Self, Self::Error> {
        let mut turns = stored.turns.into_iter();
        let mut transcript = Transcript::new();
        match turns.next() {
            Some(first) if first.role == TurnRole::System => transcript.reset(first.content),
            Some(_) => {
                return Err(DomainError::InvalidState(
                    "transcript must open with its system turn".to_string(),
                ))
            }
            None => return Ok(transcript),
        }
        for turn in turns {
            transcript.append(turn.role, turn.content)?;
        }
        Ok(transcript)
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any prior turns and start over with `system_prompt`
    pub fn reset(&mut self, system_prompt: impl Into<String>) {
        self.turns.clear();
        self.turns.push(Turn::system(system_prompt));
    }

    /// Append a user or assistant turn
    pub fn append(&mut self, role: TurnRole, text: impl Into<String>) -> Result<(), DomainError> {
        if self.turns.is_empty() {
            return Err(DomainError::InvalidState(
                "transcript must be reset with a system prompt before appending".to_string(),
            ));
        }
        if role == TurnRole::System {
            return Err(DomainError::InvalidState(
                "transcript already has its system turn".to_string(),
            ));
        }
        self.turns.push(Turn {
            role,
            content: text.into(),
        });
        Ok(())
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// True once any user or assistant turn follows the system turn
    pub fn has_exchanges(&self) -> bool {
        self.turns.len() > 1
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Patient/assistant dialogue, one turn per line, system prompt excluded
    pub fn dialogue(&self) -> String {
        self.turns
            .iter()
            .filter_map(|turn| match turn.role {
                TurnRole::System => None,
                TurnRole::User => Some(format!("Patient: {}", turn.content)),
                TurnRole::Assistant => Some(format!("Assistant: {}", turn.content)),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Every turn as `role: content`, the shape embedded in model prompts
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
