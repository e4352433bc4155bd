//! CallSummary - End-of-call model summary

use serde::{Deserialize, Serialize};

/// Structured summary produced once, when a call ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSummary {
    pub summary: String,
    /// Comma-separated keyword topics for the next call
    pub follow_up_topics: String,
    pub is_emergency: bool,
}

impl CallSummary {
    /// Alert text for the caregiver, empty when nothing needs escalation
    pub fn alert(&self) -> String {
        if self.is_emergency {
            "Emergency concern flagged during check-in call".to_string()
        } else {
            String::new()
        }
    }

    pub fn topics(&self) -> Vec<&str> {
        self.follow_up_topics
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics_split_and_trim() {
        let summary = CallSummary {
            summary: "Fine".to_string(),
            follow_up_topics: "piano concert, back pain,, refills ".to_string(),
            is_emergency: false,
        };
        assert_eq!(summary.topics(), vec!["piano concert", "back pain", "refills"]);
        assert!(summary.alert().is_empty());
    }
}
