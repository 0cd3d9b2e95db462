//! Usage: Status badge classification for request rows (live and persisted).

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusTone {
    InProgress,
    Success,
    ClientAbort,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusBadge {
    pub tone: StatusTone,
    pub label: String,
    pub title: Option<String>,
}

pub fn is_client_abort(error_code: Option<&str>) -> bool {
    matches!(error_code, Some("GW_REQUEST_ABORTED" | "GW_STREAM_ABORTED"))
}

/// Not exhaustive; unknown codes surface verbatim as the badge title.
fn error_code_title(error_code: &str) -> Option<&'static str> {
    Some(match error_code {
        "GW_REQUEST_ABORTED" => "Request aborted by client",
        "GW_STREAM_ABORTED" => "Stream aborted by client",
        "GW_UPSTREAM_TIMEOUT" => "Upstream timed out",
        "GW_STREAM_IDLE_TIMEOUT" => "Stream idle timeout",
        "GW_UPSTREAM_CONNECT_FAILED" => "Upstream connection failed",
        "GW_UPSTREAM_READ_ERROR" => "Upstream read error",
        "GW_UPSTREAM_BODY_READ_ERROR" => "Upstream body read error",
        "GW_UPSTREAM_ALL_FAILED" => "All upstream attempts failed",
        "GW_UPSTREAM_5XX" => "Upstream server error",
        "GW_UPSTREAM_4XX" => "Upstream rejected the request",
        "GW_ALL_PROVIDERS_UNAVAILABLE" => "All providers unavailable",
        "GW_NO_ENABLED_PROVIDER" => "No enabled provider",
        "GW_STREAM_ERROR" => "Stream error",
        "GW_BODY_TOO_LARGE" => "Request body too large",
        "GW_INVALID_CLI_KEY" => "Unknown CLI key",
        "GW_INTERNAL_ERROR" => "Internal gateway error",
        _ => return None,
    })
}

fn title_for(error_code: Option<&str>) -> Option<String> {
    error_code.map(|code| {
        error_code_title(code)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_string())
    })
}

pub fn classify_status(
    status: Option<i64>,
    error_code: Option<&str>,
    in_progress: bool,
) -> StatusBadge {
    if in_progress {
        return StatusBadge {
            tone: StatusTone::InProgress,
            label: "in progress".to_string(),
            title: None,
        };
    }

    let label = status
        .map(|v| v.to_string())
        .or_else(|| error_code.map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());

    if is_client_abort(error_code) {
        return StatusBadge {
            tone: StatusTone::ClientAbort,
            label,
            title: title_for(error_code),
        };
    }

    let success = error_code.is_none() && status.is_some_and(|v| (200..400).contains(&v));
    if success {
        return StatusBadge {
            tone: StatusTone::Success,
            label,
            title: None,
        };
    }

    StatusBadge {
        tone: StatusTone::Error,
        label,
        title: title_for(error_code),
    }
}
