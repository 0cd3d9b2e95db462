//! Usage: Token and latency normalization shared by every console view.

/// CLIs whose upstream reports `input_tokens` inclusive of cache reads.
fn is_cache_read_subset_cli(cli_key: &str) -> bool {
    matches!(cli_key, "codex" | "gemini")
}

pub fn token_total(total: Option<i64>, input: Option<i64>, output: Option<i64>) -> i64 {
    if let Some(t) = total {
        return t;
    }
    input.unwrap_or(0).saturating_add(output.unwrap_or(0))
}

/// Normalizes heterogeneous upstream accounting into one comparable input figure.
pub fn effective_input_tokens(
    cli_key: &str,
    input_tokens: Option<i64>,
    cache_read_input_tokens: Option<i64>,
) -> Option<i64> {
    let input = input_tokens?.max(0);
    if !is_cache_read_subset_cli(cli_key) {
        return Some(input);
    }

    let cache_read = cache_read_input_tokens.unwrap_or(0).max(0);
    Some(input.saturating_sub(cache_read))
}

/// A TTFB at or past the total duration is clock skew, not data.
pub fn sanitize_ttfb(ttfb_ms: Option<i64>, duration_ms: Option<i64>) -> Option<i64> {
    let ttfb = ttfb_ms?;
    let duration = duration_ms?;
    if ttfb < 0 || ttfb >= duration {
        return None;
    }
    Some(ttfb)
}

/// Output rate over the generation phase only (duration minus TTFB).
pub fn output_tokens_per_second(
    output_tokens: Option<i64>,
    duration_ms: Option<i64>,
    ttfb_ms: Option<i64>,
) -> Option<f64> {
    let output = output_tokens?;
    let duration = duration_ms?;
    let ttfb = sanitize_ttfb(ttfb_ms, Some(duration))?;
    if output < 0 {
        return None;
    }

    let generation_secs = duration.saturating_sub(ttfb) as f64 / 1000.0;
    if generation_secs <= 0.0 {
        return None;
    }
    Some(output as f64 / generation_secs)
}
