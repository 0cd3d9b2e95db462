//! Usage: Console engine for the AIO gateway: live trace registry, request-log synchronization, and derived view metrics.
//!
//! The desktop shell owns rendering and transport; this crate owns the
//! state machines between them: reconciling pushed trace events with the
//! persisted request-log table into one bounded, ordered, consistent view.

mod console;
mod domain;
mod gateway;
mod infra;
mod shared;

pub(crate) use infra::{db, request_attempt_logs, request_logs};

pub use console::detail::{DetailLoader, DetailSelection, DetailState, ATTEMPT_FETCH_LIMIT};
pub use console::live_strip::{
    plan as plan_live_strip, LiveStrip, LiveStripPlan, LiveTraceRow, EXIT_ANIMATION_MS,
    EXIT_BUFFER_MS, EXIT_START_DELAY_MS, EXIT_WINDOW_MS, MAX_VISIBLE_TRACES, TICK_INTERVAL,
};
pub use console::log_sync::{
    spawn_poller, LogSyncConfig, LogSyncSnapshot, LogSynchronizer, PollerHandle, RefreshOutcome,
    DASHBOARD_CAPACITY, LOG_VIEW_CAPACITY,
};
pub use console::source::{Fetched, NullLogSource, RequestLogSource};
pub use console::sqlite_source::SqliteLogSource;
pub use console::state::ConsoleState;
pub use console::trace_store::{
    SharedTraceStore, TraceAttempt, TraceSession, TraceStore, TraceSummary, DEFAULT_MAX_TRACES,
};
pub use domain::request_metrics;
pub use gateway::events::{
    AttemptOutcome, GatewayAttemptEvent, GatewayEvent, GatewayEventBus, GatewayRequestEvent,
    EVENT_BUS_CAPACITY,
};
pub use infra::db::Db;
pub use infra::logging;
pub use infra::request_attempt_logs::{
    cleanup_expired as cleanup_expired_attempts, insert as insert_attempt_log,
    list_by_trace_id as list_attempts_by_trace_id, RequestAttemptLog, RequestAttemptLogInsert,
};
pub use infra::request_logs::{
    cleanup_expired as cleanup_expired_logs, clear_all as clear_all_logs, get_by_id as get_log_by_id,
    get_by_trace_id as get_log_by_trace_id, insert_summary as insert_log_summary,
    list_after_id as list_logs_after_id, list_recent as list_recent_logs, RequestLogDetail,
    RequestLogInsert, RequestLogRouteHop, RequestLogSummary,
};
