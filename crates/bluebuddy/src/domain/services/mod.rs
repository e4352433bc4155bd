//! Domain Services
//!
//! Model-backed helpers used during and after a call, and the prompts
//! they send.

mod classifier;
pub mod prompts;
mod responder;
mod summarizer;

pub use classifier::*;
pub use responder::*;
pub use summarizer::*;
