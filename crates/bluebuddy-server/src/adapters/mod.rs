//! Infrastructure Adapters
//!
//! Implementations of domain ports for external systems.

pub mod openai;
pub mod postgres;
pub mod twilio;
pub mod twiml;

// Re-exports
pub use openai::OpenAiProvider;
pub use postgres::PgCallLogRepository;
pub use twilio::TwilioTelephony;
pub use twiml::Twiml;
