//! Usage: Incremental synchronization of the persisted request-log table into a bounded, deduplicated, newest-first view.

use crate::console::source::{Fetched, RequestLogSource};
use crate::request_logs::RequestLogSummary;
use crate::shared::mutex_ext::MutexExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Dedicated log page capacity.
pub const LOG_VIEW_CAPACITY: usize = 200;
/// Home dashboard capacity.
pub const DASHBOARD_CAPACITY: usize = 50;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct LogSyncConfig {
    pub capacity: usize,
    pub cli_filter: Option<String>,
    pub poll_interval: Duration,
}

impl Default for LogSyncConfig {
    fn default() -> Self {
        Self {
            capacity: LOG_VIEW_CAPACITY,
            cli_filter: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl LogSyncConfig {
    pub fn dashboard() -> Self {
        Self {
            capacity: DASHBOARD_CAPACITY,
            ..Self::default()
        }
    }
}

/// What a refresh call ended up doing. Failures are state, not errors;
/// callers may ignore this entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// Dropped because another fetch was already in flight.
    Skipped,
    /// Discarded because a reset invalidated this fetch while it ran.
    Stale,
    Unavailable,
    Failed,
}

#[derive(Debug, Clone)]
pub struct LogSyncSnapshot {
    pub entries: Vec<RequestLogSummary>,
    pub cursor: i64,
    pub available: bool,
    pub auto_refresh: bool,
    pub in_flight: bool,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct SyncState {
    entries: Vec<RequestLogSummary>,
    cursor: i64,
    in_flight: bool,
    fetch_seq: u64,
    available: bool,
    auto_refresh: bool,
    last_error: Option<String>,
}

impl SyncState {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            in_flight: false,
            fetch_seq: 0,
            available: true,
            auto_refresh: true,
            last_error: None,
        }
    }
}

enum FetchKind {
    Full,
    Incremental,
}

pub struct LogSynchronizer {
    source: Arc<dyn RequestLogSource>,
    config: LogSyncConfig,
    state: Mutex<SyncState>,
}

impl LogSynchronizer {
    pub fn new(source: Arc<dyn RequestLogSource>, config: LogSyncConfig) -> Arc<Self> {
        Arc::new(Self {
            source,
            config,
            state: Mutex::new(SyncState::new()),
        })
    }

    pub fn config(&self) -> &LogSyncConfig {
        &self.config
    }

    pub fn snapshot(&self) -> LogSyncSnapshot {
        let state = self.state.lock_or_recover();
        LogSyncSnapshot {
            entries: state.entries.clone(),
            cursor: state.cursor,
            available: state.available,
            auto_refresh: state.auto_refresh,
            in_flight: state.in_flight,
            last_error: state.last_error.clone(),
        }
    }

    pub fn set_auto_refresh(&self, enabled: bool) {
        self.state.lock_or_recover().auto_refresh = enabled;
    }

    /// Invalidates any in-flight fetch: its result will resolve against a
    /// newer sequence number and be discarded wholesale.
    pub fn reset(&self) {
        let mut state = self.state.lock_or_recover();
        state.fetch_seq = state.fetch_seq.wrapping_add(1);
        state.in_flight = false;
    }

    /// Fetches the most recent `capacity` rows and replaces the collection
    /// wholesale. Also the manual-retry path after the unavailable state.
    pub async fn full_refresh(&self) -> RefreshOutcome {
        let Some(seq) = self.begin_fetch() else {
            return RefreshOutcome::Skipped;
        };
        let fetched = self
            .source
            .list_recent(self.config.cli_filter.as_deref(), self.config.capacity)
            .await;
        self.finish_fetch(seq, fetched, FetchKind::Full)
    }

    /// Fetches only rows past the cursor and merges them in. Falls back to
    /// a full refresh when nothing is known yet.
    pub async fn incremental_refresh(&self) -> RefreshOutcome {
        enum Plan {
            Skip,
            Full,
            Incremental(i64),
        }

        let plan = {
            let state = self.state.lock_or_recover();
            if state.in_flight {
                Plan::Skip
            } else if state.entries.is_empty() {
                Plan::Full
            } else {
                Plan::Incremental(state.cursor)
            }
        };

        match plan {
            Plan::Skip => RefreshOutcome::Skipped,
            Plan::Full => self.full_refresh().await,
            Plan::Incremental(after_id) => {
                let Some(seq) = self.begin_fetch() else {
                    return RefreshOutcome::Skipped;
                };
                let fetched = self
                    .source
                    .list_after_id(
                        self.config.cli_filter.as_deref(),
                        after_id,
                        self.config.capacity,
                    )
                    .await;
                self.finish_fetch(seq, fetched, FetchKind::Incremental)
            }
        }
    }

    fn begin_fetch(&self) -> Option<u64> {
        let mut state = self.state.lock_or_recover();
        if state.in_flight {
            return None;
        }
        state.in_flight = true;
        state.fetch_seq = state.fetch_seq.wrapping_add(1);
        Some(state.fetch_seq)
    }

    fn finish_fetch(
        &self,
        seq: u64,
        fetched: Result<Fetched<Vec<RequestLogSummary>>, String>,
        kind: FetchKind,
    ) -> RefreshOutcome {
        let mut state = self.state.lock_or_recover();
        if state.fetch_seq != seq {
            // A reset invalidated this fetch while it was in flight.
            return RefreshOutcome::Stale;
        }
        state.in_flight = false;

        match fetched {
            Ok(Fetched::Unavailable) => {
                state.available = false;
                tracing::info!("request log source unavailable; automatic polling stops");
                RefreshOutcome::Unavailable
            }
            Ok(Fetched::Data(rows)) => {
                match kind {
                    FetchKind::Full => apply_full(&mut state, rows, self.config.capacity),
                    FetchKind::Incremental => {
                        apply_incremental(&mut state, rows, self.config.capacity)
                    }
                }
                state.available = true;
                state.last_error = None;
                RefreshOutcome::Applied
            }
            Err(err) => {
                // Transient: availability and the polling cadence are untouched.
                tracing::warn!(error = %err, "request log fetch failed");
                state.last_error = Some(err);
                RefreshOutcome::Failed
            }
        }
    }
}

fn sort_newest_first(entries: &mut [RequestLogSummary]) {
    entries.sort_by(|a, b| {
        b.effective_timestamp_ms()
            .cmp(&a.effective_timestamp_ms())
            .then(b.id.cmp(&a.id))
    });
}

fn dedupe_by_id(entries: Vec<RequestLogSummary>) -> Vec<RequestLogSummary> {
    let mut seen: HashSet<i64> = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|row| seen.insert(row.id))
        .collect()
}

fn max_id(entries: &[RequestLogSummary]) -> i64 {
    entries.iter().map(|row| row.id).max().unwrap_or(0)
}

fn apply_full(state: &mut SyncState, rows: Vec<RequestLogSummary>, capacity: usize) {
    let mut rows = dedupe_by_id(rows);
    sort_newest_first(&mut rows);
    rows.truncate(capacity);
    // Ids are insertion-monotone upstream, so the cursor never moves back.
    state.cursor = state.cursor.max(max_id(&rows));
    state.entries = rows;
}

/// Incoming wins; nothing already known is dropped except by capacity.
fn apply_incremental(state: &mut SyncState, incoming: Vec<RequestLogSummary>, capacity: usize) {
    let mut merged = dedupe_by_id(incoming);
    let incoming_ids: HashSet<i64> = merged.iter().map(|row| row.id).collect();
    merged.extend(
        std::mem::take(&mut state.entries)
            .into_iter()
            .filter(|row| !incoming_ids.contains(&row.id)),
    );
    sort_newest_first(&mut merged);
    merged.truncate(capacity);
    state.cursor = state.cursor.max(max_id(&merged));
    state.entries = merged;
}

/// Aborts on drop so a dismissed page cannot leak its polling task.
pub struct PollerHandle {
    task: tokio::task::JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Fixed-cadence incremental polling. Exits for good once the source
/// reports unavailable; ticks are skipped (but the task stays parked)
/// while auto-refresh is toggled off.
pub fn spawn_poller(sync: Arc<LogSynchronizer>) -> PollerHandle {
    let period = sync.config.poll_interval;
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The immediate first tick; the mount path has already refreshed.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let (available, auto_refresh) = {
                let state = sync.state.lock_or_recover();
                (state.available, state.auto_refresh)
            };
            if !available {
                break;
            }
            if !auto_refresh {
                continue;
            }
            if sync.incremental_refresh().await == RefreshOutcome::Unavailable {
                break;
            }
        }
        tracing::debug!("request log poller stopped");
    });
    PollerHandle { task }
}
