//! Usage: SQLite connection pool setup, schema install, and common DB helpers.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_millis(2000);
const SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS request_logs (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  trace_id TEXT NOT NULL UNIQUE,
  cli_key TEXT NOT NULL,
  method TEXT NOT NULL,
  path TEXT NOT NULL,
  query TEXT,
  status INTEGER,
  error_code TEXT,
  duration_ms INTEGER NOT NULL DEFAULT 0,
  ttfb_ms INTEGER,
  attempts_json TEXT NOT NULL DEFAULT '[]',
  input_tokens INTEGER,
  output_tokens INTEGER,
  total_tokens INTEGER,
  cache_read_input_tokens INTEGER,
  cache_creation_input_tokens INTEGER,
  cache_creation_5m_input_tokens INTEGER,
  cache_creation_1h_input_tokens INTEGER,
  usage_json TEXT,
  requested_model TEXT,
  cost_usd_femto INTEGER,
  cost_multiplier REAL NOT NULL DEFAULT 1.0,
  created_at_ms INTEGER NOT NULL DEFAULT 0,
  created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_request_logs_recency
  ON request_logs (created_at_ms DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_request_logs_cli_key
  ON request_logs (cli_key);

CREATE TABLE IF NOT EXISTS request_attempt_logs (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  trace_id TEXT NOT NULL,
  cli_key TEXT NOT NULL,
  method TEXT NOT NULL,
  path TEXT NOT NULL,
  query TEXT,
  attempt_index INTEGER NOT NULL,
  provider_id INTEGER NOT NULL,
  provider_name TEXT NOT NULL,
  base_url TEXT NOT NULL DEFAULT '',
  outcome TEXT NOT NULL,
  status INTEGER,
  attempt_started_ms INTEGER NOT NULL DEFAULT 0,
  attempt_duration_ms INTEGER NOT NULL DEFAULT 0,
  created_at INTEGER NOT NULL,
  UNIQUE (trace_id, attempt_index)
);

CREATE INDEX IF NOT EXISTS idx_request_attempt_logs_trace
  ON request_attempt_logs (trace_id, attempt_index);
"#;

#[derive(Clone)]
pub struct Db {
    pool: Pool<SqliteConnectionManager>,
}

impl Db {
    pub fn open(path: &Path) -> Result<Self, String> {
        let path_hint = path.to_string_lossy().to_string();
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            configure_connection(conn)
        });

        let pool = Pool::new(manager).map_err(|e| format!("DB_ERROR: failed to create pool: {e}"))?;
        let db = Db { pool };
        db.install_schema()
            .map_err(|e| format!("{e} (at {path_hint})"))?;
        Ok(db)
    }

    /// A single-connection pool: every pooled handle of a `:memory:`
    /// manager would otherwise be its own empty database.
    pub fn open_in_memory() -> Result<Self, String> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| configure_connection(conn));
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| format!("DB_ERROR: failed to create pool: {e}"))?;
        let db = Db { pool };
        db.install_schema()?;
        Ok(db)
    }

    pub fn open_connection(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, String> {
        self.pool
            .get()
            .map_err(|e| format!("DB_ERROR: failed to get connection from pool: {e}"))
    }

    fn install_schema(&self) -> Result<(), String> {
        let conn = self.open_connection()?;
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(|e| format!("DB_ERROR: failed to read user_version: {e}"))?;

        if version >= SCHEMA_VERSION {
            return Ok(());
        }

        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| format!("DB_ERROR: schema install failed: {e}"))?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(|e| format!("DB_ERROR: failed to set user_version: {e}"))?;
        Ok(())
    }
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
"#,
    )?;

    Ok(())
}
