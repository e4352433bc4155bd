//! Service Ports
//!
//! Abstract interfaces for external services.

mod llm_provider;
mod telephony;

pub use llm_provider::*;
pub use telephony::*;
