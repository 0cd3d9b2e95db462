//! Usage: Request log DTOs and insertion payloads.

use crate::domain::request_metrics::{ChainHop, HopOutcome};
use crate::gateway::events::GatewayRequestEvent;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct RequestLogInsert {
    pub trace_id: String,
    pub cli_key: String,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub status: Option<i64>,
    pub error_code: Option<String>,
    pub duration_ms: i64,
    pub ttfb_ms: Option<i64>,
    pub attempts_json: String,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub cache_read_input_tokens: Option<i64>,
    pub cache_creation_input_tokens: Option<i64>,
    pub cache_creation_5m_input_tokens: Option<i64>,
    pub cache_creation_1h_input_tokens: Option<i64>,
    pub usage_json: Option<String>,
    pub requested_model: Option<String>,
    pub cost_usd_femto: Option<i64>,
    pub cost_multiplier: f64,
    pub created_at_ms: i64,
    pub created_at: i64,
}

impl RequestLogInsert {
    /// The persisted row the gateway would write for a terminal event.
    /// `attempts_json` is the serialized hop list accumulated alongside.
    pub fn from_request_event(event: &GatewayRequestEvent, attempts_json: String) -> Self {
        Self {
            trace_id: event.trace_id.clone(),
            cli_key: event.cli_key.clone(),
            method: event.method.clone(),
            path: event.path.clone(),
            query: event.query.clone(),
            status: event.status,
            error_code: event.error_code.clone(),
            duration_ms: event.duration_ms,
            ttfb_ms: event.ttfb_ms,
            attempts_json,
            input_tokens: event.input_tokens,
            output_tokens: event.output_tokens,
            total_tokens: event.total_tokens,
            cache_read_input_tokens: event.cache_read_input_tokens,
            cache_creation_input_tokens: event.cache_creation_input_tokens,
            cache_creation_5m_input_tokens: None,
            cache_creation_1h_input_tokens: None,
            usage_json: None,
            requested_model: event.requested_model.clone(),
            cost_usd_femto: None,
            cost_multiplier: 1.0,
            created_at_ms: event.created_at_ms,
            created_at: event.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestLogRouteHop {
    pub provider_id: i64,
    pub provider_name: String,
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestLogSummary {
    pub id: i64,
    pub trace_id: String,
    pub cli_key: String,
    pub method: String,
    pub path: String,
    pub requested_model: Option<String>,
    pub status: Option<i64>,
    pub error_code: Option<String>,
    pub duration_ms: i64,
    pub ttfb_ms: Option<i64>,
    pub attempt_count: i64,
    pub has_failover: bool,
    pub start_provider_id: i64,
    pub start_provider_name: String,
    pub final_provider_id: i64,
    pub final_provider_name: String,
    pub route: Vec<RequestLogRouteHop>,
    pub session_reuse: bool,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub cache_read_input_tokens: Option<i64>,
    pub cache_creation_input_tokens: Option<i64>,
    pub cache_creation_5m_input_tokens: Option<i64>,
    pub cache_creation_1h_input_tokens: Option<i64>,
    pub cost_usd: Option<f64>,
    pub cost_multiplier: f64,
    pub created_at_ms: i64,
    pub created_at: i64,
}

impl RequestLogSummary {
    /// Ordering key for the console view: high-resolution timestamp when
    /// the row carries a valid one, else seconds scaled up.
    pub fn effective_timestamp_ms(&self) -> i64 {
        if self.created_at_ms > 0 {
            self.created_at_ms
        } else {
            self.created_at.saturating_mul(1000)
        }
    }

    pub fn chain_hops(&self) -> Vec<ChainHop> {
        self.route
            .iter()
            .map(|hop| ChainHop {
                provider_name: hop.provider_name.clone(),
                outcome: if hop.ok {
                    HopOutcome::Success
                } else {
                    HopOutcome::Failed
                },
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestLogDetail {
    pub id: i64,
    pub trace_id: String,
    pub cli_key: String,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub status: Option<i64>,
    pub error_code: Option<String>,
    pub duration_ms: i64,
    pub ttfb_ms: Option<i64>,
    pub attempts_json: String,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub cache_read_input_tokens: Option<i64>,
    pub cache_creation_input_tokens: Option<i64>,
    pub cache_creation_5m_input_tokens: Option<i64>,
    pub cache_creation_1h_input_tokens: Option<i64>,
    pub usage_json: Option<String>,
    pub requested_model: Option<String>,
    pub cost_usd: Option<f64>,
    pub cost_multiplier: f64,
    pub created_at_ms: i64,
    pub created_at: i64,
}
