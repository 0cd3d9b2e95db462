//! Usage: Request log persistence (insert, queries, retention cleanup).

use crate::db;
use crate::shared::cli_key::validate_cli_key;
use crate::shared::time::now_unix_seconds;
use rusqlite::params;

mod queries;
mod types;

pub use queries::{get_by_id, get_by_trace_id, list_after_id, list_recent};
pub use types::{RequestLogDetail, RequestLogInsert, RequestLogRouteHop, RequestLogSummary};

/// Upsert on `trace_id`: a replayed terminal event refreshes the row
/// instead of duplicating it, and the original insertion timestamps win.
pub fn insert_summary(db: &db::Db, item: &RequestLogInsert) -> Result<i64, String> {
    validate_cli_key(&item.cli_key)?;

    let conn = db.open_connection()?;
    conn.execute(
        r#"
INSERT INTO request_logs (
  trace_id,
  cli_key,
  method,
  path,
  query,
  status,
  error_code,
  duration_ms,
  ttfb_ms,
  attempts_json,
  input_tokens,
  output_tokens,
  total_tokens,
  cache_read_input_tokens,
  cache_creation_input_tokens,
  cache_creation_5m_input_tokens,
  cache_creation_1h_input_tokens,
  usage_json,
  requested_model,
  cost_usd_femto,
  cost_multiplier,
  created_at_ms,
  created_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)
ON CONFLICT(trace_id) DO UPDATE SET
  method = excluded.method,
  path = excluded.path,
  query = excluded.query,
  status = excluded.status,
  error_code = excluded.error_code,
  duration_ms = excluded.duration_ms,
  ttfb_ms = excluded.ttfb_ms,
  attempts_json = excluded.attempts_json,
  input_tokens = excluded.input_tokens,
  output_tokens = excluded.output_tokens,
  total_tokens = excluded.total_tokens,
  cache_read_input_tokens = excluded.cache_read_input_tokens,
  cache_creation_input_tokens = excluded.cache_creation_input_tokens,
  cache_creation_5m_input_tokens = excluded.cache_creation_5m_input_tokens,
  cache_creation_1h_input_tokens = excluded.cache_creation_1h_input_tokens,
  usage_json = excluded.usage_json,
  requested_model = excluded.requested_model,
  cost_usd_femto = excluded.cost_usd_femto,
  cost_multiplier = excluded.cost_multiplier,
  created_at_ms = CASE
    WHEN request_logs.created_at_ms = 0 THEN excluded.created_at_ms
    ELSE request_logs.created_at_ms
  END,
  created_at = CASE
    WHEN request_logs.created_at = 0 THEN excluded.created_at
    ELSE request_logs.created_at
  END
"#,
        params![
            item.trace_id,
            item.cli_key,
            item.method,
            item.path,
            item.query,
            item.status,
            item.error_code,
            item.duration_ms,
            item.ttfb_ms,
            item.attempts_json,
            item.input_tokens,
            item.output_tokens,
            item.total_tokens,
            item.cache_read_input_tokens,
            item.cache_creation_input_tokens,
            item.cache_creation_5m_input_tokens,
            item.cache_creation_1h_input_tokens,
            item.usage_json,
            item.requested_model,
            item.cost_usd_femto,
            item.cost_multiplier,
            item.created_at_ms,
            item.created_at
        ],
    )
    .map_err(|e| format!("DB_ERROR: failed to insert request_log: {e}"))?;

    conn.query_row(
        "SELECT id FROM request_logs WHERE trace_id = ?1",
        params![item.trace_id],
        |row| row.get(0),
    )
    .map_err(|e| format!("DB_ERROR: failed to read inserted request_log id: {e}"))
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
            "DELETE FROM request_logs WHERE created_at < ?1",
            params![cutoff],
        )
        .map_err(|e| format!("DB_ERROR: failed to cleanup request_logs: {e}"))?;

    Ok(changed as u64)
}

pub fn clear_all(db: &db::Db) -> Result<u64, String> {
    let conn = db.open_connection()?;
    let changed = conn
        .execute("DELETE FROM request_logs", [])
        .map_err(|e| format!("DB_ERROR: failed to clear request_logs: {e}"))?;
    Ok(changed as u64)
}
