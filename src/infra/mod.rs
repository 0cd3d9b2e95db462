//! Usage: Infrastructure adapters (persistence, process-ambient logging).

pub mod db;
pub mod logging;
pub mod request_attempt_logs;
pub mod request_logs;
