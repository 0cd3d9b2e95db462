//! Usage: Attempt log persistence (insert, per-trace queries, retention cleanup).

use crate::db;
use crate::gateway::events::GatewayAttemptEvent;
use crate::shared::cli_key::validate_cli_key;
use crate::shared::time::now_unix_seconds;
use rusqlite::params;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct RequestAttemptLogInsert {
    pub trace_id: String,
    pub cli_key: String,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub attempt_index: i64,
    pub provider_id: i64,
    pub provider_name: String,
    pub base_url: String,
    pub outcome: String,
    pub status: Option<i64>,
    pub attempt_started_ms: i64,
    pub attempt_duration_ms: i64,
    pub created_at: i64,
}

impl RequestAttemptLogInsert {
    pub fn from_attempt_event(event: &GatewayAttemptEvent, created_at: i64) -> Self {
        Self {
            trace_id: event.trace_id.clone(),
            cli_key: event.cli_key.clone(),
            method: event.method.clone(),
            path: event.path.clone(),
            query: event.query.clone(),
            attempt_index: event.attempt_index,
            provider_id: event.provider_id,
            provider_name: event.provider_name.clone(),
            base_url: event.base_url.clone(),
            outcome: event.outcome.as_str().to_string(),
            status: event.status,
            attempt_started_ms: event.attempt_started_ms,
            attempt_duration_ms: event.attempt_duration_ms,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestAttemptLog {
    pub id: i64,
    pub trace_id: String,
    pub cli_key: String,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub attempt_index: i64,
    pub provider_id: i64,
    pub provider_name: String,
    pub base_url: String,
    pub outcome: String,
    pub status: Option<i64>,
    pub attempt_started_ms: i64,
    pub attempt_duration_ms: i64,
    pub created_at: i64,
}

/// Upsert on `(trace_id, attempt_index)`: replayed attempt events refresh
/// the hop record in place.
pub fn insert(db: &db::Db, item: &RequestAttemptLogInsert) -> Result<(), String> {
    validate_cli_key(&item.cli_key)?;

    let conn = db.open_connection()?;
    conn.execute(
        r#"
INSERT INTO request_attempt_logs (
  trace_id,
  cli_key,
  method,
  path,
  query,
  attempt_index,
  provider_id,
  provider_name,
  base_url,
  outcome,
  status,
  attempt_started_ms,
  attempt_duration_ms,
  created_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
ON CONFLICT(trace_id, attempt_index) DO UPDATE SET
  method = excluded.method,
  path = excluded.path,
  query = excluded.query,
  provider_id = excluded.provider_id,
  provider_name = excluded.provider_name,
  base_url = excluded.base_url,
  outcome = excluded.outcome,
  status = excluded.status,
  attempt_started_ms = excluded.attempt_started_ms,
  attempt_duration_ms = excluded.attempt_duration_ms
"#,
        params![
            item.trace_id,
            item.cli_key,
            item.method,
            item.path,
            item.query,
            item.attempt_index,
            item.provider_id,
            item.provider_name,
            item.base_url,
            item.outcome,
            item.status,
            item.attempt_started_ms,
            item.attempt_duration_ms,
            item.created_at
        ],
    )
    .map_err(|e| format!("DB_ERROR: failed to insert request_attempt_log: {e}"))?;

    Ok(())
}

fn row_to_log(row: &rusqlite::Row<'_>) -> Result<RequestAttemptLog, rusqlite::Error> {
    Ok(RequestAttemptLog {
        id: row.get("id")?,
        trace_id: row.get("trace_id")?,
        cli_key: row.get("cli_key")?,
        method: row.get("method")?,
        path: row.get("path")?,
        query: row.get("query")?,
        attempt_index: row.get("attempt_index")?,
        provider_id: row.get("provider_id")?,
        provider_name: row.get("provider_name")?,
        base_url: row.get("base_url")?,
        outcome: row.get("outcome")?,
        status: row.get("status")?,
        attempt_started_ms: row.get("attempt_started_ms")?,
        attempt_duration_ms: row.get("attempt_duration_ms")?,
        created_at: row.get("created_at")?,
    })
}

pub fn list_by_trace_id(
    db: &db::Db,
    trace_id: &str,
    limit: usize,
) -> Result<Vec<RequestAttemptLog>, String> {
    let trace_id = trace_id.trim();
    if trace_id.is_empty() {
        return Err("SEC_INVALID_INPUT: trace_id is required".to_string());
    }

    let limit = limit.clamp(1, 200);
    let conn = db.open_connection()?;

    let mut stmt = conn
        .prepare(
            r#"
SELECT
  id,
  trace_id,
  cli_key,
  method,
  path,
  query,
  attempt_index,
  provider_id,
  provider_name,
  base_url,
  outcome,
  status,
  attempt_started_ms,
  attempt_duration_ms,
  created_at
FROM request_attempt_logs
WHERE trace_id = ?1
ORDER BY attempt_index ASC, id ASC
LIMIT ?2
"#,
        )
        .map_err(|e| format!("DB_ERROR: failed to prepare attempt query: {e}"))?;

    let rows = stmt
        .query_map(params![trace_id, limit as i64], row_to_log)
        .map_err(|e| format!("DB_ERROR: failed to query request_attempt_logs: {e}"))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| format!("DB_ERROR: failed to read attempt row: {e}"))?);
    }
    Ok(out)
}

pub fn cleanup_expired(db: &db::Db, retention_days: u32) -> Result<u64, String> {
    if retention_days == 0 {
        return Err("SEC_INVALID_INPUT: log_retention_days must be >= 1".to_string());
    }

    let now = now_unix_seconds();
    let cutoff = now.saturating_sub((retention_days as i64).saturating_mul(86400));

    let conn = db.open_connection()?;
    let changed = conn
        .execute(
            "DELETE FROM request_attempt_logs WHERE created_at < ?1",
            params![cutoff],
        )
        .map_err(|e| format!("DB_ERROR: failed to cleanup request_attempt_logs: {e}"))?;

    Ok(changed as u64)
}
