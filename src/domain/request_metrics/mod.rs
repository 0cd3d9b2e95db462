//! Usage: Derived metrics for request rows (token normalization, rates, status badges, provider chains).

mod chain;
mod status;
mod tokens;

pub use chain::{collapse_hops, summarize_chain, ChainHop, HopOutcome, ProviderChainSummary};
pub use status::{classify_status, is_client_abort, StatusBadge, StatusTone};
pub use tokens::{effective_input_tokens, output_tokens_per_second, sanitize_ttfb, token_total};

#[cfg(test)]
mod tests;
