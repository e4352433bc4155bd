//! CallStatus - Outcome recorded on a persisted call log

use serde::{Deserialize, Serialize};

/// Call log status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    #[default]
    Pending,
    Confirmed,
    Missed,
    Rescheduled,
}

impl CallStatus {
    /// Map the telephony provider's terminal call status.
    ///
    /// Calls that never connected are missed; a connected call is confirmed
    /// once the patient actually said something.
    pub fn from_outcome(provider_status: Option<&str>, had_exchange: bool) -> Self {
        let unreachable = matches!(
            provider_status.map(|s| s.to_lowercase()).as_deref(),
            Some("busy" | "no-answer" | "failed" | "canceled")
        );
        if unreachable || !had_exchange {
            CallStatus::Missed
        } else {
            CallStatus::Confirmed
        }
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallStatus::Pending => write!(f, "pending"),
            CallStatus::Confirmed => write!(f, "confirmed"),
            CallStatus::Missed => write!(f, "missed"),
            CallStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

impl std::str::FromStr for CallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(CallStatus::Pending),
            "confirmed" => Ok(CallStatus::Confirmed),
            "missed" => Ok(CallStatus::Missed),
            "rescheduled" => Ok(CallStatus::Rescheduled),
            _ => Err(format!("Unknown call status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(
            CallStatus::from_outcome(Some("completed"), true),
            CallStatus::Confirmed
        );
        assert_eq!(
            CallStatus::from_outcome(Some("completed"), false),
            CallStatus::Missed
        );
        assert_eq!(
            CallStatus::from_outcome(Some("no-answer"), false),
            CallStatus::Missed
        );
        assert_eq!(CallStatus::from_outcome(None, true), CallStatus::Confirmed);
    }
}
