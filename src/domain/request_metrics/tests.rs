use super::*;

#[test]
fn effective_input_subtracts_cache_reads_for_subset_clis() {
    assert_eq!(effective_input_tokens("codex", Some(1000), Some(400)), Some(600));
    assert_eq!(effective_input_tokens("gemini", Some(1000), Some(400)), Some(600));
    assert_eq!(effective_input_tokens("claude", Some(1000), Some(400)), Some(1000));
}

#[test]
fn effective_input_never_goes_negative() {
    assert_eq!(effective_input_tokens("codex", Some(100), Some(400)), Some(0));
    assert_eq!(effective_input_tokens("codex", Some(100), None), Some(100));
    assert_eq!(effective_input_tokens("codex", None, Some(400)), None);
    assert_eq!(effective_input_tokens("codex", Some(-5), Some(2)), Some(0));
}

#[test]
fn token_total_prefers_reported_total() {
    assert_eq!(token_total(Some(999), Some(1), Some(2)), 999);
    assert_eq!(token_total(None, Some(10), Some(20)), 30);
    assert_eq!(token_total(None, None, None), 0);
}

#[test]
fn ttfb_at_or_past_duration_is_dropped() {
    assert_eq!(sanitize_ttfb(Some(500), Some(300)), None);
    assert_eq!(sanitize_ttfb(Some(300), Some(300)), None);
    assert_eq!(sanitize_ttfb(Some(100), Some(300)), Some(100));
    assert_eq!(sanitize_ttfb(Some(-1), Some(300)), None);
    assert_eq!(sanitize_ttfb(None, Some(300)), None);
    assert_eq!(sanitize_ttfb(Some(100), None), None);
}

#[test]
fn output_rate_covers_generation_phase_only() {
    // 100 tokens over (1100 - 100) ms of generation = 100 tok/s.
    let rate = output_tokens_per_second(Some(100), Some(1100), Some(100)).unwrap();
    assert!((rate - 100.0).abs() < 1e-9);

    assert_eq!(output_tokens_per_second(None, Some(1100), Some(100)), None);
    assert_eq!(output_tokens_per_second(Some(100), None, Some(100)), None);
    assert_eq!(output_tokens_per_second(Some(100), Some(1100), None), None);
    // Inconsistent TTFB sanitizes to absent, so no rate.
    assert_eq!(output_tokens_per_second(Some(100), Some(300), Some(500)), None);
}

#[test]
fn badge_in_progress_wins_over_everything() {
    let badge = classify_status(Some(200), Some("GW_INTERNAL_ERROR"), true);
    assert_eq!(badge.tone, StatusTone::InProgress);
    assert!(badge.title.is_none());
}

#[test]
fn badge_success_requires_2xx_3xx_and_no_error_code() {
    assert_eq!(classify_status(Some(200), None, false).tone, StatusTone::Success);
    assert_eq!(classify_status(Some(304), None, false).tone, StatusTone::Success);
    assert_eq!(
        classify_status(Some(200), Some("GW_STREAM_ERROR"), false).tone,
        StatusTone::Error
    );
    assert_eq!(classify_status(Some(500), None, false).tone, StatusTone::Error);
    assert_eq!(classify_status(None, None, false).tone, StatusTone::Error);
}

#[test]
fn badge_client_abort_codes() {
    let badge = classify_status(Some(499), Some("GW_REQUEST_ABORTED"), false);
    assert_eq!(badge.tone, StatusTone::ClientAbort);
    assert_eq!(badge.label, "499");
    assert_eq!(badge.title.as_deref(), Some("Request aborted by client"));
    assert!(is_client_abort(Some("GW_STREAM_ABORTED")));
    assert!(!is_client_abort(Some("GW_UPSTREAM_TIMEOUT")));
    assert!(!is_client_abort(None));
}

#[test]
fn badge_unknown_error_code_passes_through_verbatim() {
    let badge = classify_status(None, Some("GW_SOMETHING_NEW"), false);
    assert_eq!(badge.tone, StatusTone::Error);
    assert_eq!(badge.label, "GW_SOMETHING_NEW");
    assert_eq!(badge.title.as_deref(), Some("GW_SOMETHING_NEW"));
}

fn hop(name: &str, outcome: HopOutcome) -> ChainHop {
    ChainHop {
        provider_name: name.to_string(),
        outcome,
    }
}

#[test]
fn collapse_keeps_most_successful_consecutive_outcome() {
    let hops = vec![
        hop("A", HopOutcome::Failed),
        hop("A", HopOutcome::Success),
        hop("B", HopOutcome::Started),
    ];
    let collapsed = collapse_hops(&hops);
    assert_eq!(collapsed.len(), 2);
    assert_eq!(collapsed[0], hop("A", HopOutcome::Success));
    assert_eq!(collapsed[1], hop("B", HopOutcome::Started));
}

#[test]
fn collapse_does_not_merge_non_consecutive_repeats() {
    let hops = vec![
        hop("A", HopOutcome::Failed),
        hop("B", HopOutcome::Failed),
        hop("A", HopOutcome::Success),
    ];
    assert_eq!(collapse_hops(&hops).len(), 3);
}

#[test]
fn chain_summary_single_provider() {
    let summary = summarize_chain(&[hop("A", HopOutcome::Success)]).unwrap();
    assert_eq!(summary.start, "A");
    assert_eq!(summary.end, "A");
    assert_eq!(summary.compact, "A");
    assert_eq!(summary.hidden_hops, 0);
}

#[test]
fn chain_summary_counts_hidden_intermediates() {
    let hops = vec![
        hop("A", HopOutcome::Failed),
        hop("B", HopOutcome::Failed),
        hop("C", HopOutcome::Failed),
        hop("D", HopOutcome::Success),
    ];
    let summary = summarize_chain(&hops).unwrap();
    assert_eq!(summary.compact, "A → D (+2)");
    assert_eq!(summary.hidden_hops, 2);

    let two = summarize_chain(&hops[2..]).unwrap();
    assert_eq!(two.compact, "C → D");
    assert_eq!(two.hidden_hops, 0);
}

#[test]
fn chain_summary_empty_is_none() {
    assert!(summarize_chain(&[]).is_none());
}
