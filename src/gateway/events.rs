//! Usage: Gateway push-event payloads and the in-process bus the console subscribes to.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default bus depth; a console that falls this far behind resyncs from
/// the persisted log table on the next poll anyway.
pub const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Started,
    Success,
    Failed,
    #[serde(other)]
    Unknown,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Started => "started",
            AttemptOutcome::Success => "success",
            AttemptOutcome::Failed => "failed",
            AttemptOutcome::Unknown => "unknown",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "started" => AttemptOutcome::Started,
            "success" => AttemptOutcome::Success,
            "failed" => AttemptOutcome::Failed,
            _ => AttemptOutcome::Unknown,
        }
    }
}

/// One provider hop inside a request's failover sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayAttemptEvent {
    pub trace_id: String,
    pub cli_key: String,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub attempt_index: i64,
    pub provider_id: i64,
    pub provider_name: String,
    pub base_url: String,
    pub outcome: AttemptOutcome,
    pub status: Option<i64>,
    pub session_reuse: bool,
    pub attempt_started_ms: i64,
    pub attempt_duration_ms: i64,
}

/// Terminal event for a request: the gateway finished (or gave up on) it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRequestEvent {
    pub trace_id: String,
    pub cli_key: String,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub status: Option<i64>,
    pub error_code: Option<String>,
    pub duration_ms: i64,
    pub ttfb_ms: Option<i64>,
    pub requested_model: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub cache_read_input_tokens: Option<i64>,
    pub cache_creation_input_tokens: Option<i64>,
    pub created_at_ms: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    Attempt(GatewayAttemptEvent),
    Request(GatewayRequestEvent),
}

impl GatewayEvent {
    pub fn trace_id(&self) -> &str {
        match self {
            GatewayEvent::Attempt(event) => &event.trace_id,
            GatewayEvent::Request(event) => &event.trace_id,
        }
    }
}

/// In-process stand-in for the desktop shell's push channel. Delivery is
/// at-least-once from the consumer's point of view; the trace store's
/// upsert semantics absorb replays.
#[derive(Debug, Clone)]
pub struct GatewayEventBus {
    tx: broadcast::Sender<GatewayEvent>,
}

impl Default for GatewayEventBus {
    fn default() -> Self {
        Self::new(EVENT_BUS_CAPACITY)
    }
}

impl GatewayEventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.tx.subscribe()
    }

    pub fn emit_attempt(&self, event: GatewayAttemptEvent) {
        self.emit(GatewayEvent::Attempt(event));
    }

    pub fn emit_request(&self, event: GatewayRequestEvent) {
        self.emit(GatewayEvent::Request(event));
    }

    pub fn emit(&self, event: GatewayEvent) {
        // No subscribers is normal (console page not open).
        let _ = self.tx.send(event);
    }
}
