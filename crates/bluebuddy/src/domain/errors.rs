//! Domain Errors
//!
//! Error types for domain operations.

use thiserror::Error;
use uuid::Uuid;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    /// Telephony or language model call failed (transport, HTTP status, timeout)
    #[error("Provider unavailable: {provider}: {message}")]
    ProviderUnavailable { provider: String, message: String },

    /// Model response did not match the requested structure
    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    /// Operation attempted out of sequence
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl DomainError {
    pub fn not_found<T: AsRef<str>>(entity_type: T, id: Uuid) -> Self {
        Self::NotFound {
            entity_type: entity_type.as_ref().to_string(),
            id: id.to_string(),
        }
    }

    pub fn provider<P: AsRef<str>>(provider: P, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.as_ref().to_string(),
            message: message.into(),
        }
    }

    /// Whether the error points at an integration bug rather than a runtime condition
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidState(_) | Self::NotFound { .. } | Self::Validation(_)
        )
    }
}
