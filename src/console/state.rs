//! Usage: Page-level console wiring: trace store, log sync, live strip, detail loader, event pump.

use crate::console::detail::DetailLoader;
use crate::console::live_strip::LiveStrip;
use crate::console::log_sync::{self, LogSyncConfig, LogSynchronizer, PollerHandle};
use crate::console::source::RequestLogSource;
use crate::console::trace_store::{SharedTraceStore, TraceStore, DEFAULT_MAX_TRACES};
use crate::gateway::events::GatewayEventBus;
use crate::shared::mutex_ext::MutexExt;
use crate::shared::time::now_unix_millis;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;

/// One console page instance. The home dashboard and the dedicated log
/// page each hold their own (different capacities), possibly sharing the
/// trace store.
pub struct ConsoleState {
    pub traces: SharedTraceStore,
    pub logs: Arc<LogSynchronizer>,
    pub live: LiveStrip,
    pub detail: Arc<DetailLoader>,
    pump: Mutex<Option<tokio::task::JoinHandle<()>>>,
    poller: Mutex<Option<PollerHandle>>,
}

impl ConsoleState {
    pub fn new(source: Arc<dyn RequestLogSource>, config: LogSyncConfig) -> Arc<Self> {
        Self::with_trace_store(source, config, TraceStore::shared(DEFAULT_MAX_TRACES))
    }

    pub fn with_trace_store(
        source: Arc<dyn RequestLogSource>,
        config: LogSyncConfig,
        traces: SharedTraceStore,
    ) -> Arc<Self> {
        let logs = LogSynchronizer::new(Arc::clone(&source), config);
        let live = LiveStrip::new(Arc::clone(&traces));
        let detail = DetailLoader::new(source);
        Arc::new(Self {
            traces,
            logs,
            live,
            detail,
            pump: Mutex::new(None),
            poller: Mutex::new(None),
        })
    }

    /// Subscribes to the gateway bus and applies every event to the trace
    /// store, replanning the live strip as events land. A lagged receiver
    /// just skips ahead; replayed events are absorbed by upsert semantics.
    pub fn attach_events(&self, bus: &GatewayEventBus) {
        let mut rx = bus.subscribe();
        let traces = Arc::clone(&self.traces);
        let live = self.live.clone();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let now_ms = now_unix_millis();
                        traces.lock_or_recover().apply_event(&event, now_ms);
                        live.refresh(now_ms);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "console event pump lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        *self.pump.lock_or_recover() = Some(handle);
    }

    /// Initial full refresh plus the polling task (unless the source
    /// reported unavailable on the spot).
    pub async fn mount(&self) {
        let _ = self.logs.full_refresh().await;
        if self.logs.snapshot().available {
            let handle = log_sync::spawn_poller(Arc::clone(&self.logs));
            *self.poller.lock_or_recover() = Some(handle);
        }
    }

    /// Tears down every task this page owns. Timers must not leak past
    /// unmount.
    pub fn shutdown(&self) {
        if let Some(handle) = self.pump.lock_or_recover().take() {
            handle.abort();
        }
        if let Some(poller) = self.poller.lock_or_recover().take() {
            poller.stop();
        }
        self.live.stop();
    }
}

impl Drop for ConsoleState {
    fn drop(&mut self) {
        self.shutdown();
    }
}
