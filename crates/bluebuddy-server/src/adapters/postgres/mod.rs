//! PostgreSQL Repository Implementations

mod call_log_repository;

pub use call_log_repository::PgCallLogRepository;
