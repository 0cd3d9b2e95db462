//! Usage: Collaborator seam for log queries, with the capability-unavailable sentinel.

use crate::request_attempt_logs::RequestAttemptLog;
use crate::request_logs::{RequestLogDetail, RequestLogSummary};
use async_trait::async_trait;

/// A fetch either yields data or reports that the capability is absent in
/// this environment (e.g. the console runs outside the desktop shell).
/// Unavailability is a state, not an error; transient failures travel as
/// `Err` on the surrounding `Result`.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Data(T),
    Unavailable,
}

impl<T> Fetched<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Data(value) => Fetched::Data(f(value)),
            Fetched::Unavailable => Fetched::Unavailable,
        }
    }
}

#[async_trait]
pub trait RequestLogSource: Send + Sync {
    async fn list_recent(
        &self,
        cli_key: Option<&str>,
        limit: usize,
    ) -> Result<Fetched<Vec<RequestLogSummary>>, String>;

    async fn list_after_id(
        &self,
        cli_key: Option<&str>,
        after_id: i64,
        limit: usize,
    ) -> Result<Fetched<Vec<RequestLogSummary>>, String>;

    async fn get_by_id(&self, log_id: i64) -> Result<Fetched<Option<RequestLogDetail>>, String>;

    async fn get_by_trace_id(
        &self,
        trace_id: &str,
    ) -> Result<Fetched<Option<RequestLogDetail>>, String>;

    async fn attempts_by_trace_id(
        &self,
        trace_id: &str,
        limit: usize,
    ) -> Result<Fetched<Vec<RequestAttemptLog>>, String>;
}

/// The environment without log storage: every command reports the
/// unavailable sentinel.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogSource;

#[async_trait]
impl RequestLogSource for NullLogSource {
    async fn list_recent(
        &self,
        _cli_key: Option<&str>,
        _limit: usize,
    ) -> Result<Fetched<Vec<RequestLogSummary>>, String> {
        Ok(Fetched::Unavailable)
    }

    async fn list_after_id(
        &self,
        _cli_key: Option<&str>,
        _after_id: i64,
        _limit: usize,
    ) -> Result<Fetched<Vec<RequestLogSummary>>, String> {
        Ok(Fetched::Unavailable)
    }

    async fn get_by_id(&self, _log_id: i64) -> Result<Fetched<Option<RequestLogDetail>>, String> {
        Ok(Fetched::Unavailable)
    }

    async fn get_by_trace_id(
        &self,
        _trace_id: &str,
    ) -> Result<Fetched<Option<RequestLogDetail>>, String> {
        Ok(Fetched::Unavailable)
    }

    async fn attempts_by_trace_id(
        &self,
        _trace_id: &str,
        _limit: usize,
    ) -> Result<Fetched<Vec<RequestAttemptLog>>, String> {
        Ok(Fetched::Unavailable)
    }
}
