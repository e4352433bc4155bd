//! BlueBuddy API Models
//!
//! - Call: placement requests, live sessions, call logs
//! - Voice: telephony provider callback forms

mod call;
mod voice;

pub use call::*;
pub use voice::*;
