//! Repository Ports
//!
//! Abstract interfaces for data persistence operations.

mod call_log_repository;

pub use call_log_repository::*;
