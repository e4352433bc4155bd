//! Domain Entities
//!
//! Pure domain models without infrastructure dependencies.
//! - Transcript: Ordered turns of one call
//! - CallSession: Live state of one in-progress call
//! - PatientContext: Who is being called and what to ask about
//! - CallSummary: End-of-call model summary
//! - CallLog: Persisted record of a finished call

mod call_log;
mod call_session;
mod call_summary;
mod patient;
mod transcript;

pub use call_log::*;
pub use call_session::*;
pub use call_summary::*;
pub use patient::*;
pub use transcript::*;
