//! Usage: Collapse provider failover chains into a compact display summary.

use crate::gateway::events::AttemptOutcome;
use serde::Serialize;

/// Variant order is the collapse ranking: later = more successful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HopOutcome {
    Failed,
    Started,
    Success,
}

impl From<AttemptOutcome> for HopOutcome {
    fn from(outcome: AttemptOutcome) -> Self {
        match outcome {
            AttemptOutcome::Success => HopOutcome::Success,
            AttemptOutcome::Failed => HopOutcome::Failed,
            AttemptOutcome::Started | AttemptOutcome::Unknown => HopOutcome::Started,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainHop {
    pub provider_name: String,
    pub outcome: HopOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderChainSummary {
    pub start: String,
    pub end: String,
    pub compact: String,
    pub hidden_hops: usize,
}

/// Consecutive hops on the same provider show once, keeping the most
/// successful outcome, so an internal retry without a hop-ending failure
/// does not inflate the chain.
pub fn collapse_hops(hops: &[ChainHop]) -> Vec<ChainHop> {
    let mut out: Vec<ChainHop> = Vec::with_capacity(hops.len());
    for hop in hops {
        match out.last_mut() {
            Some(last) if last.provider_name == hop.provider_name => {
                if hop.outcome > last.outcome {
                    last.outcome = hop.outcome;
                }
            }
            _ => out.push(hop.clone()),
        }
    }
    out
}

pub fn summarize_chain(hops: &[ChainHop]) -> Option<ProviderChainSummary> {
    let collapsed = collapse_hops(hops);
    let first = collapsed.first()?;
    let last = collapsed.last()?;

    let start = first.provider_name.clone();
    let end = last.provider_name.clone();
    if collapsed.len() == 1 {
        return Some(ProviderChainSummary {
            compact: start.clone(),
            start: start.clone(),
            end,
            hidden_hops: 0,
        });
    }

    let hidden_hops = collapsed.len().saturating_sub(2);
    let compact = if hidden_hops > 0 {
        format!("{start} → {end} (+{hidden_hops})")
    } else {
        format!("{start} → {end}")
    };

    Some(ProviderChainSummary {
        start,
        end,
        compact,
        hidden_hops,
    })
}
