//! Usage: Opt-in tracing initialization for embedders (env filter, fmt, optional rolling file).

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "aio-console.log";

/// Keeps the file writer flushing; drop it last.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// The host shell owns process logging in production; this is for
/// standalone embedding and examples. Safe to call once per process.
pub fn init(log_dir: Option<&Path>) -> Result<LogGuard, String> {
    // Route `log` records from dependencies into tracing first.
    let _ = tracing_log::LogTracer::init();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    let guard = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .try_init()
                .map_err(|e| format!("LOG_INIT_ERROR: {e}"))?;
            Some(guard)
        }
        None => {
            registry
                .try_init()
                .map_err(|e| format!("LOG_INIT_ERROR: {e}"))?;
            None
        }
    };

    Ok(LogGuard { _file: guard })
}
