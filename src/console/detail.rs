//! Usage: Detail and attempt-breakdown loading for a selected request, with stale-response rejection.

use crate::console::source::{Fetched, RequestLogSource};
use crate::request_attempt_logs::RequestAttemptLog;
use crate::request_logs::RequestLogDetail;
use crate::shared::mutex_ext::MutexExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub const ATTEMPT_FETCH_LIMIT: usize = 200;

/// A detail view can be opened from either side of the console: by row id
/// from the persisted list or by trace id from the live strip. Both
/// converge on the same detail identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailSelection {
    LogId(i64),
    TraceId(String),
}

#[derive(Debug, Clone)]
pub struct DetailState {
    pub selection: Option<DetailSelection>,
    pub loading: bool,
    pub detail: Option<RequestLogDetail>,
    pub attempts: Vec<RequestAttemptLog>,
    /// The summary still exists but the detail row was evicted by
    /// retention. Expected, terminal, never auto-retried.
    pub missing: bool,
    pub available: bool,
    pub last_error: Option<String>,
}

impl Default for DetailState {
    fn default() -> Self {
        Self {
            selection: None,
            loading: false,
            detail: None,
            attempts: Vec::new(),
            missing: false,
            available: true,
            last_error: None,
        }
    }
}

pub struct DetailLoader {
    source: Arc<dyn RequestLogSource>,
    seq: AtomicU64,
    state: Mutex<DetailState>,
}

impl DetailLoader {
    pub fn new(source: Arc<dyn RequestLogSource>) -> Arc<Self> {
        Arc::new(Self {
            source,
            seq: AtomicU64::new(0),
            state: Mutex::new(DetailState::default()),
        })
    }

    pub fn snapshot(&self) -> DetailState {
        self.state.lock_or_recover().clone()
    }

    pub fn clear(&self) {
        // Bumping the sequence orphans any fetch still in flight.
        self.seq.fetch_add(1, Ordering::SeqCst);
        *self.state.lock_or_recover() = DetailState::default();
    }

    fn is_current(&self, seq: u64) -> bool {
        self.seq.load(Ordering::SeqCst) == seq
    }

    /// Loads detail, then the attempt breakdown keyed by the resolved
    /// detail's trace_id (not the originally selected key). Responses for
    /// a selection that is no longer current are discarded.
    pub async fn select(&self, selection: DetailSelection) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock_or_recover();
            state.selection = Some(selection.clone());
            state.loading = true;
            state.detail = None;
            state.attempts.clear();
            state.missing = false;
            state.last_error = None;
        }

        let fetched = match &selection {
            DetailSelection::LogId(log_id) => self.source.get_by_id(*log_id).await,
            DetailSelection::TraceId(trace_id) => self.source.get_by_trace_id(trace_id).await,
        };
        if !self.is_current(seq) {
            return;
        }

        let detail = match fetched {
            Err(err) => {
                tracing::warn!(error = %err, "request detail fetch failed");
                let mut state = self.state.lock_or_recover();
                state.loading = false;
                state.last_error = Some(err);
                return;
            }
            Ok(Fetched::Unavailable) => {
                let mut state = self.state.lock_or_recover();
                state.loading = false;
                state.available = false;
                return;
            }
            Ok(Fetched::Data(None)) => {
                let mut state = self.state.lock_or_recover();
                state.loading = false;
                state.missing = true;
                return;
            }
            Ok(Fetched::Data(Some(detail))) => detail,
        };

        let attempts = self
            .source
            .attempts_by_trace_id(&detail.trace_id, ATTEMPT_FETCH_LIMIT)
            .await;
        if !self.is_current(seq) {
            return;
        }

        let mut state = self.state.lock_or_recover();
        state.loading = false;
        state.detail = Some(detail);
        match attempts {
            Ok(Fetched::Data(rows)) => state.attempts = rows,
            Ok(Fetched::Unavailable) => {}
            Err(err) => {
                tracing::warn!(error = %err, "attempt breakdown fetch failed");
                state.last_error = Some(err);
            }
        }
    }
}
