//! Application Layer (Use Cases)
//!
//! Drives the per-call conversation state machine and coordinates the
//! language model, telephony provider and call log repository.

mod call_service;
mod reaper;
mod session_store;

pub use call_service::{CallService, CallSettings, PlacedSession};
pub use reaper::spawn_session_reaper;
