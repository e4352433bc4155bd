//! CallPhase - Lifecycle position of a live call

use serde::{Deserialize, Serialize};

/// Phase of a call session.
///
/// `Idle` has no variant: a call is idle exactly when no session exists
/// for its id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallPhase {
    /// Session created, outbound call request in flight
    Placing,
    /// Provider accepted the call, waiting for the answer callback
    Ringing,
    /// Waiting for the next recognized utterance
    Listening,
    /// Classifying and responding to an utterance
    Processing,
    /// Hang-up requested or ended callback received, summary pending
    Ending,
    /// Summary persisted; the session is about to be dropped
    Ended,
}

impl CallPhase {
    pub fn can_answer(&self) -> bool {
        matches!(self, CallPhase::Ringing | CallPhase::Listening)
    }

    pub fn can_process_speech(&self) -> bool {
        matches!(self, CallPhase::Listening)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CallPhase::Ended)
    }
}

impl std::fmt::Display for CallPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallPhase::Placing => write!(f, "placing"),
            CallPhase::Ringing => write!(f, "ringing"),
            CallPhase::Listening => write!(f, "listening"),
            CallPhase::Processing => write!(f, "processing"),
            CallPhase::Ending => write!(f, "ending"),
            CallPhase::Ended => write!(f, "ended"),
        }
    }
}
