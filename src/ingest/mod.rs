//! Telemetry ingest: folds observer reports into per-tab state.
//!
//! `report` mutates state synchronously and returns immediately. Memory/CPU
//! enrichment runs afterwards on a tokio runtime and lands in the store
//! whenever it resolves. The runtime is, in order of preference: the one given
//! to [`TelemetryIngest::with_runtime`], the caller's ambient runtime, or a
//! small background runtime started on first use.

pub mod enrichment;

use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use url::Url;

use crate::config::IngestConfig;
use crate::state::{NetworkActivityLevel, TabId};
use crate::store::{EnrichmentTicket, TabStore};
use crate::telemetry::{non_negative, ActivityReport, TelemetryPayload, TransferReport};

pub use enrichment::{
    EnrichmentSources, HeapMemorySource, ProcessMetrics, ProcessMetricsSource, SourceFuture,
};

static BACKGROUND: Lazy<Option<Runtime>> = Lazy::new(|| {
    Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("tabsentinel-enrichment")
        .enable_time()
        .build()
        .map_err(|e| tracing::warn!(error = %e, "failed to start background enrichment runtime"))
        .ok()
});

/// The only writer of tab state.
#[derive(Debug)]
pub struct TelemetryIngest {
    store: Arc<TabStore>,
    config: IngestConfig,
    sources: EnrichmentSources,
    runtime: Option<Handle>,
}

impl TelemetryIngest {
    pub fn new(store: Arc<TabStore>, config: IngestConfig) -> Self {
        Self {
            store,
            config,
            sources: EnrichmentSources::default(),
            runtime: None,
        }
    }

    pub fn with_sources(mut self, sources: EnrichmentSources) -> Self {
        self.sources = sources;
        self
    }

    pub fn store(&self) -> &Arc<TabStore> {
        &self.store
    }

    /// Run enrichment on this runtime instead of the caller's.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Fold one payload into the tab's state, creating the state if needed.
    ///
    /// Returns the handle of the enrichment task when an activity report
    /// spawned one. Dropping the handle leaves the task running.
    pub fn report(&self, tab: TabId, payload: TelemetryPayload) -> Option<JoinHandle<()>> {
        match payload {
            TelemetryPayload::Activity(report) => return self.record_activity(tab, &report),
            TelemetryPayload::Transfer(transfer) => self.record_transfer(tab, &transfer),
            TelemetryPayload::WasmDetected => {
                self.store
                    .update(tab, |record| record.state_mut().wasm_detected = true);
            }
            TelemetryPayload::WorkerCreated { count } => {
                let count = non_negative(count).min(f64::from(u32::MAX)) as u32;
                self.store.update(tab, |record| {
                    let state = record.state_mut();
                    state.worker_count = state.worker_count.max(count);
                });
            }
        }
        None
    }

    /// The tab finished loading a page: start over with a zero state.
    pub fn navigation_complete(&self, tab: TabId, url: Option<&str>) {
        let site = url
            .and_then(|u| Url::parse(u).ok())
            .and_then(|u| u.host_str().map(str::to_owned));
        tracing::debug!(tab = %tab, site = ?site, "navigation complete, resetting tab state");
        self.store.reset(tab, site);
    }

    /// The tab was closed: forget it.
    pub fn tab_closed(&self, tab: TabId) {
        if self.store.remove(tab) {
            tracing::debug!(tab = %tab, "tab closed, state dropped");
        }
    }

    fn record_activity(&self, tab: TabId, report: &ActivityReport) -> Option<JoinHandle<()>> {
        let cpu = report.cpu_activity_score(&self.config);
        let ticket = self.store.update(tab, |record| {
            let state = record.state_mut();
            state.cpu_activity_score = cpu;
            state.worker_count = state.worker_count.max(report.workers());
            state.wasm_detected |= report.wasm();
            state.network_activity_level =
                NetworkActivityLevel::from_request_count(report.requests());
            record.begin_cycle()
        });
        self.enrich(tab, ticket, report.memory_mb())
    }

    // Page-level and network-layer observers may both report the same transfer;
    // both are counted.
    fn record_transfer(&self, tab: TabId, transfer: &TransferReport) {
        self.store.update(tab, |record| {
            let state = record.state_mut();
            state.data_sent = state.data_sent.saturating_add(transfer.sent());
            state.data_received = state.data_received.saturating_add(transfer.received());
        });
    }

    fn enrich(
        &self,
        tab: TabId,
        ticket: EnrichmentTicket,
        payload_memory: Option<f64>,
    ) -> Option<JoinHandle<()>> {
        if !self.sources.is_empty() {
            if let Some(runtime) = self.enrichment_runtime() {
                let store = Arc::clone(&self.store);
                let sources = self.sources.clone();
                let config = self.config.clone();
                return Some(runtime.spawn(async move {
                    let reading = sources.resolve(tab, payload_memory, &config).await;
                    if !store.apply_enrichment(tab, ticket, reading) {
                        tracing::trace!(
                            tab = %tab,
                            tier = %reading.source,
                            "enrichment result not applied"
                        );
                    }
                }));
            }
            tracing::warn!(tab = %tab, "no runtime for enrichment, using local tiers only");
        }

        let reading = enrichment::resolve_local(tab, payload_memory, &self.config);
        self.store.apply_enrichment(tab, ticket, reading);
        None
    }

    fn enrichment_runtime(&self) -> Option<Handle> {
        self.runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
            .or_else(|| BACKGROUND.as_ref().map(|rt| rt.handle().clone()))
    }
}
