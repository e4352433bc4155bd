//! Telephony Provider Port
//!
//! Places outbound calls. In-call behavior is not a method here: the
//! provider calls back and receives a `VoiceScript` in response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Outbound call request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundCall {
    pub to: String,
    pub from: String,
    /// Fetched by the provider when the call is answered
    pub answer_url: String,
    /// Notified by the provider when the line closes
    pub ended_url: String,
}

/// Provider acknowledgment of a placed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedCall {
    /// Provider call identifier (Twilio `CallSid`)
    pub call_sid: String,
    pub status: String,
}

#[async_trait]
pub trait TelephonyProvider: Send + Sync {
    /// Ask the provider to dial `call.to`
    async fn place_call(&self, call: &OutboundCall) -> Result<PlacedCall, DomainError>;

    /// Get the provider name (e.g., "twilio")
    fn provider_name(&self) -> &str;
}
