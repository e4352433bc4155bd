//! MedicationStatus - What the patient said about a medication

use serde::{Deserialize, Serialize};

/// Observed medication status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MedicationStatus {
    Taken,
    NotTaking,
    Delayed,
    TakingLater,
    NeedRefill,
}

impl MedicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MedicationStatus::Taken => "taken",
            MedicationStatus::NotTaking => "not-taking",
            MedicationStatus::Delayed => "delayed",
            MedicationStatus::TakingLater => "taking-later",
            MedicationStatus::NeedRefill => "need-refill",
        }
    }
}

impl std::fmt::Display for MedicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MedicationStatus {
    type Err = String;

    /// Accepts the spoken variants the classifier tends to produce
    /// ("not taking", "taking_later", "Need Refill", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_lowercase()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "taken" => Ok(MedicationStatus::Taken),
            "not" | "not taking" | "not taken" => Ok(MedicationStatus::NotTaking),
            "delayed" => Ok(MedicationStatus::Delayed),
            "taking later" => Ok(MedicationStatus::TakingLater),
            "need refill" | "needs refill" => Ok(MedicationStatus::NeedRefill),
            _ => Err(format!("Unknown medication status: {}", s)),
        }
    }
}
