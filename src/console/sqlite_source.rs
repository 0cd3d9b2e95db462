//! Usage: sqlite-backed implementation of the log query commands.

use crate::console::source::{Fetched, RequestLogSource};
use crate::request_attempt_logs::{self, RequestAttemptLog};
use crate::request_logs::{self, RequestLogDetail, RequestLogSummary};
use crate::shared::blocking;
use crate::{db, db::Db};
use async_trait::async_trait;

/// The production collaborator: queries run on the blocking pool so the
/// console's event loop never waits on sqlite.
#[derive(Clone)]
pub struct SqliteLogSource {
    db: Db,
}

impl SqliteLogSource {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &db::Db {
        &self.db
    }
}

#[async_trait]
impl RequestLogSource for SqliteLogSource {
    async fn list_recent(
        &self,
        cli_key: Option<&str>,
        limit: usize,
    ) -> Result<Fetched<Vec<RequestLogSummary>>, String> {
        let db = self.db.clone();
        let cli_key = cli_key.map(str::to_string);
        blocking::run("request_logs_list", move || {
            request_logs::list_recent(&db, cli_key.as_deref(), limit)
        })
        .await
        .map(Fetched::Data)
    }

    async fn list_after_id(
        &self,
        cli_key: Option<&str>,
        after_id: i64,
        limit: usize,
    ) -> Result<Fetched<Vec<RequestLogSummary>>, String> {
        let db = self.db.clone();
        let cli_key = cli_key.map(str::to_string);
        blocking::run("request_logs_list_after_id", move || {
            request_logs::list_after_id(&db, cli_key.as_deref(), after_id, limit)
        })
        .await
        .map(Fetched::Data)
    }

    async fn get_by_id(&self, log_id: i64) -> Result<Fetched<Option<RequestLogDetail>>, String> {
        let db = self.db.clone();
        blocking::run("request_log_get", move || {
            request_logs::get_by_id(&db, log_id)
        })
        .await
        .map(Fetched::Data)
    }

    async fn get_by_trace_id(
        &self,
        trace_id: &str,
    ) -> Result<Fetched<Option<RequestLogDetail>>, String> {
        let db = self.db.clone();
        let trace_id = trace_id.to_string();
        blocking::run("request_log_get_by_trace_id", move || {
            request_logs::get_by_trace_id(&db, &trace_id)
        })
        .await
        .map(Fetched::Data)
    }

    async fn attempts_by_trace_id(
        &self,
        trace_id: &str,
        limit: usize,
    ) -> Result<Fetched<Vec<RequestAttemptLog>>, String> {
        let db = self.db.clone();
        let trace_id = trace_id.to_string();
        blocking::run("request_attempt_logs_by_trace_id", move || {
            request_attempt_logs::list_by_trace_id(&db, &trace_id, limit)
        })
        .await
        .map(Fetched::Data)
    }
}
