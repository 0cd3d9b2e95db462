//! Usage: In-memory registry of live request traces fed by gateway events.

use crate::domain::request_metrics::ChainHop;
use crate::gateway::events::{
    AttemptOutcome, GatewayAttemptEvent, GatewayEvent, GatewayRequestEvent,
};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const DEFAULT_MAX_TRACES: usize = 100;

pub type SharedTraceStore = Arc<Mutex<TraceStore>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceAttempt {
    pub attempt_index: i64,
    pub provider_id: i64,
    pub provider_name: String,
    pub outcome: AttemptOutcome,
    pub status: Option<i64>,
    pub session_reuse: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceSummary {
    pub status: Option<i64>,
    pub error_code: Option<String>,
    pub duration_ms: i64,
    pub ttfb_ms: Option<i64>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub cache_read_input_tokens: Option<i64>,
    pub cache_creation_input_tokens: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceSession {
    pub trace_id: String,
    pub cli_key: String,
    pub method: String,
    pub path: String,
    pub requested_model: Option<String>,
    pub first_seen_ms: i64,
    pub last_seen_ms: i64,
    pub attempts: Vec<TraceAttempt>,
    pub summary: Option<TraceSummary>,
}

impl TraceSession {
    pub fn in_progress(&self) -> bool {
        self.summary.is_none()
    }

    pub fn chain_hops(&self) -> Vec<ChainHop> {
        self.attempts
            .iter()
            .map(|attempt| ChainHop {
                provider_name: attempt.provider_name.clone(),
                outcome: attempt.outcome.into(),
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct TraceStore {
    sessions: HashMap<String, TraceSession>,
    /// Insertion order of `sessions` keys; consumers re-sort as needed.
    order: Vec<String>,
    max_traces: usize,
    selected: Option<String>,
}

impl Default for TraceStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRACES)
    }
}

impl TraceStore {
    pub fn new(max_traces: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            order: Vec::new(),
            max_traces: max_traces.max(1),
            selected: None,
        }
    }

    pub fn shared(max_traces: usize) -> SharedTraceStore {
        Arc::new(Mutex::new(Self::new(max_traces)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn apply_event(&mut self, event: &GatewayEvent, now_ms: i64) {
        match event {
            GatewayEvent::Attempt(attempt) => self.apply_attempt(attempt, now_ms),
            GatewayEvent::Request(request) => self.apply_summary(request, now_ms),
        }
    }

    /// Upsert by trace_id: first sight creates the session, later events
    /// append hops. Arrival time always bumps `last_seen_ms`.
    pub fn apply_attempt(&mut self, event: &GatewayAttemptEvent, now_ms: i64) {
        if event.trace_id.is_empty() {
            return;
        }

        let session = self.upsert_session(
            &event.trace_id,
            &event.cli_key,
            &event.method,
            &event.path,
            now_ms,
        );
        session.attempts.push(TraceAttempt {
            attempt_index: event.attempt_index,
            provider_id: event.provider_id,
            provider_name: event.provider_name.clone(),
            outcome: event.outcome,
            status: event.status,
            session_reuse: event.session_reuse,
        });
        session.last_seen_ms = now_ms;
        self.evict_over_cap();
    }

    /// A terminal event sets the summary. Once set it is never cleared;
    /// replayed attempt events may still append hops afterwards without
    /// resurrecting in-progress state.
    pub fn apply_summary(&mut self, event: &GatewayRequestEvent, now_ms: i64) {
        if event.trace_id.is_empty() {
            return;
        }

        let session = self.upsert_session(
            &event.trace_id,
            &event.cli_key,
            &event.method,
            &event.path,
            now_ms,
        );
        if event.requested_model.is_some() {
            session.requested_model = event.requested_model.clone();
        }
        session.summary = Some(TraceSummary {
            status: event.status,
            error_code: event.error_code.clone(),
            duration_ms: event.duration_ms,
            ttfb_ms: event.ttfb_ms,
            input_tokens: event.input_tokens,
            output_tokens: event.output_tokens,
            total_tokens: event.total_tokens,
            cache_read_input_tokens: event.cache_read_input_tokens,
            cache_creation_input_tokens: event.cache_creation_input_tokens,
        });
        session.last_seen_ms = now_ms;
        self.evict_over_cap();
    }

    fn upsert_session(
        &mut self,
        trace_id: &str,
        cli_key: &str,
        method: &str,
        path: &str,
        now_ms: i64,
    ) -> &mut TraceSession {
        match self.sessions.entry(trace_id.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.order.push(trace_id.to_string());
                entry.insert(TraceSession {
                    trace_id: trace_id.to_string(),
                    cli_key: cli_key.to_string(),
                    method: method.to_string(),
                    path: path.to_string(),
                    requested_model: None,
                    first_seen_ms: now_ms,
                    last_seen_ms: now_ms,
                    attempts: Vec::new(),
                    summary: None,
                })
            }
        }
    }

    /// Oldest completed traces go first; in-progress traces are evicted
    /// only while the cap is still exceeded after that.
    fn evict_over_cap(&mut self) {
        while self.order.len() > self.max_traces {
            let victim = self
                .order
                .iter()
                .filter(|id| {
                    self.sessions
                        .get(id.as_str())
                        .is_some_and(|s| s.summary.is_some())
                })
                .min_by_key(|id| {
                    self.sessions
                        .get(id.as_str())
                        .map(|s| s.first_seen_ms)
                        .unwrap_or(i64::MIN)
                })
                .or_else(|| {
                    self.order.iter().min_by_key(|id| {
                        self.sessions
                            .get(id.as_str())
                            .map(|s| s.first_seen_ms)
                            .unwrap_or(i64::MIN)
                    })
                })
                .cloned();

            let Some(victim) = victim else {
                return;
            };
            self.sessions.remove(&victim);
            self.order.retain(|id| id != &victim);
            if self.selected.as_deref() == Some(victim.as_str()) {
                self.selected = None;
            }
        }
    }

    /// Owned clones in insertion order; consumers never see the live map.
    pub fn snapshot(&self) -> Vec<TraceSession> {
        self.order
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .cloned()
            .collect()
    }

    pub fn get(&self, trace_id: &str) -> Option<TraceSession> {
        self.sessions.get(trace_id).cloned()
    }

    pub fn select(&mut self, trace_id: Option<&str>) {
        self.selected = match trace_id {
            Some(id) if self.sessions.contains_key(id) => Some(id.to_string()),
            _ => None,
        };
    }

    pub fn selected(&self) -> Option<String> {
        self.selected.clone()
    }

    /// Substring filter over trace_id; an empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<TraceSession> {
        let query = query.trim();
        if query.is_empty() {
            return self.snapshot();
        }
        self.order
            .iter()
            .filter(|id| id.contains(query))
            .filter_map(|id| self.sessions.get(id))
            .cloned()
            .collect()
    }
}
