//! PatientContext - Who is being called and what to ask about
//!
//! Supplied by the scheduler/caregiver layer when a call is placed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Patient context carried for the duration of one call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientContext {
    pub patient_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub caregiver_number: Option<String>,
    /// Medication name -> last known status, as the caregiver recorded it
    pub prescriptions: BTreeMap<String, String>,
    pub bio: Option<String>,
    /// Follow-up topics carried over from the previous call's summary
    pub follow_up_topics: Option<String>,
}

impl PatientContext {
    pub fn new(
        patient_id: i64,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            patient_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone_number: phone_number.into(),
            caregiver_number: None,
            prescriptions: BTreeMap::new(),
            bio: None,
            follow_up_topics: None,
        }
    }

    pub fn with_prescription(mut self, name: impl Into<String>, status: impl Into<String>) -> Self {
        self.prescriptions.insert(name.into(), status.into());
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn with_follow_up_topics(mut self, topics: impl Into<String>) -> Self {
        self.follow_up_topics = Some(topics.into());
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Follow-up topics, if any non-blank text was provided
    pub fn follow_ups(&self) -> Option<&str> {
        self.follow_up_topics
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.first_name.trim().is_empty() {
            return Err(DomainError::Validation(
                "patient first name is required".to_string(),
            ));
        }
        if self.phone_number.trim().is_empty() {
            return Err(DomainError::Validation(
                "patient phone number is required".to_string(),
            ));
        }
        Ok(())
    }
}
