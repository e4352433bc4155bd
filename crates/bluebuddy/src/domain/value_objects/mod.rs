//! Value Objects
//!
//! Immutable objects defined by their attributes rather than identity.

mod call_phase;
mod call_status;
mod medication_status;
mod voice_instruction;

pub use call_phase::*;
pub use call_status::*;
pub use medication_status::*;
pub use voice_instruction::*;
