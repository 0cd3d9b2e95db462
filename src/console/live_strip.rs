//! Usage: Visibility planning and tick scheduling for the realtime trace strip.

use crate::console::trace_store::{SharedTraceStore, TraceSession};
use crate::shared::mutex_ext::MutexExt;
use crate::shared::time::now_unix_millis;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// A completed trace starts its exit transition after this long...
pub const EXIT_START_DELAY_MS: i64 = 200;
/// ...animates for this long...
pub const EXIT_ANIMATION_MS: i64 = 700;
/// ...and gets a little slack before removal.
pub const EXIT_BUFFER_MS: i64 = 100;
pub const EXIT_WINDOW_MS: i64 = EXIT_START_DELAY_MS + EXIT_ANIMATION_MS + EXIT_BUFFER_MS;

pub const TICK_INTERVAL: Duration = Duration::from_millis(250);
pub const MAX_VISIBLE_TRACES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveTraceRow {
    pub trace: TraceSession,
    /// Set once a completed trace is old enough for the renderer to start
    /// its fade, ahead of actual removal at the window edge.
    pub exiting: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveStripPlan {
    pub rows: Vec<LiveTraceRow>,
    /// True while at least one completed trace still needs a future
    /// re-evaluation; drives the ticker lifecycle.
    pub needs_tick: bool,
}

/// Pure visibility computation: in-progress traces always show, completed
/// ones only inside the exit window. Newest first, capped.
pub fn plan(snapshot: &[TraceSession], now_ms: i64) -> LiveStripPlan {
    let mut rows: Vec<LiveTraceRow> = Vec::new();
    let mut needs_tick = false;

    for trace in snapshot {
        if trace.summary.is_none() {
            rows.push(LiveTraceRow {
                trace: trace.clone(),
                exiting: false,
            });
            continue;
        }

        let age = now_ms.saturating_sub(trace.last_seen_ms);
        if age < EXIT_WINDOW_MS {
            needs_tick = true;
            rows.push(LiveTraceRow {
                trace: trace.clone(),
                exiting: age > EXIT_START_DELAY_MS,
            });
        }
    }

    rows.sort_by(|a, b| b.trace.first_seen_ms.cmp(&a.trace.first_seen_ms));
    rows.truncate(MAX_VISIBLE_TRACES);
    LiveStripPlan { rows, needs_tick }
}

struct StripInner {
    store: SharedTraceStore,
    plan_tx: watch::Sender<LiveStripPlan>,
    ticker_running: AtomicBool,
    ticker: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

/// Publishes plans on a watch channel and keeps a 250 ms ticker alive only
/// while some completed trace still needs re-evaluation. An idle strip
/// runs no timer. Cheap to clone; clones share one ticker.
#[derive(Clone)]
pub struct LiveStrip {
    inner: Arc<StripInner>,
}

impl LiveStrip {
    pub fn new(store: SharedTraceStore) -> Self {
        let (plan_tx, _) = watch::channel(LiveStripPlan::default());
        Self {
            inner: Arc::new(StripInner {
                store,
                plan_tx,
                ticker_running: AtomicBool::new(false),
                ticker: Mutex::new(None),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveStripPlan> {
        self.inner.plan_tx.subscribe()
    }

    pub fn current_plan(&self) -> LiveStripPlan {
        self.inner.plan_tx.borrow().clone()
    }

    pub fn ticker_active(&self) -> bool {
        self.inner.ticker_running.load(Ordering::SeqCst)
    }

    /// Recomputes the plan now; starts the ticker if the plan needs one.
    pub fn refresh(&self, now_ms: i64) -> LiveStripPlan {
        let snapshot = self.inner.store.lock_or_recover().snapshot();
        let next = plan(&snapshot, now_ms);
        // send_replace: the plan must update even with no subscribers yet.
        let _ = self.inner.plan_tx.send_replace(next.clone());
        if next.needs_tick {
            self.ensure_ticker();
        }
        next
    }

    fn ensure_ticker(&self) {
        if self.inner.ticker_running.swap(true, Ordering::SeqCst) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Consume the interval's immediate first tick.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let snapshot = inner.store.lock_or_recover().snapshot();
                let next = plan(&snapshot, now_unix_millis());
                let still_needed = next.needs_tick;
                let _ = inner.plan_tx.send_replace(next);
                if !still_needed {
                    break;
                }
            }
            inner.ticker_running.store(false, Ordering::SeqCst);
        });
        *self.inner.ticker.lock_or_recover() = Some(handle);
    }

    /// Explicit teardown for page unmount.
    pub fn stop(&self) {
        if let Some(handle) = self.inner.ticker.lock_or_recover().take() {
            handle.abort();
        }
        self.inner.ticker_running.store(false, Ordering::SeqCst);
    }
}
