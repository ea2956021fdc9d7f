//! tab-sentinel: per-tab resource monitoring and risk scoring for browser extensions.
//!
//! Telemetry about a page's runtime behaviour (event-loop activity, memory,
//! workers, network volume, WebAssembly) is folded into one state record per
//! tab, and each record can be reduced on demand to a Green/Yellow/Red verdict
//! with a list of warnings.
//!
//! # Quick Start
//!
//! ```no_run
//! use tabsentinel::config::Config;
//! use tabsentinel::state::TabId;
//! use tabsentinel::telemetry::{ActivityReport, TelemetryPayload};
//! use tabsentinel::TabMonitor;
//!
//! let monitor = TabMonitor::new(&Config::default());
//! let report = ActivityReport {
//!     event_loop_busy_time: Some(850.0),
//!     network_request_count: Some(14.0),
//!     ..Default::default()
//! };
//! monitor.report(TabId(1), TelemetryPayload::Activity(report));
//! let view = monitor.tab_data(TabId(1)).unwrap();
//! println!("{}: {:?}", view.risk_level, view.warnings);
//! ```

pub mod config;
pub mod error;
pub mod ingest;
pub mod output;
pub mod replay;
pub mod risk;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod view;

use std::sync::Arc;

use tokio::task::JoinHandle;

use config::Config;
use error::Result;
use ingest::{EnrichmentSources, TelemetryIngest};
use output::OutputFormat;
use replay::{TabEvent, TabEventKind};
use state::TabId;
use store::TabStore;
use telemetry::TelemetryPayload;
use view::TabDataView;

/// Owns the tab store and wires it into ingest and the presenter view.
#[derive(Debug)]
pub struct TabMonitor {
    ingest: TelemetryIngest,
}

impl TabMonitor {
    pub fn new(config: &Config) -> Self {
        let store = Arc::new(TabStore::new());
        Self {
            ingest: TelemetryIngest::new(store, config.ingest.clone()),
        }
    }

    /// Attach asynchronous enrichment sources (process metrics, page heap).
    pub fn with_sources(mut self, sources: EnrichmentSources) -> Self {
        self.ingest = self.ingest.with_sources(sources);
        self
    }

    /// Run enrichment on the given runtime rather than the caller's.
    pub fn with_runtime(mut self, runtime: tokio::runtime::Handle) -> Self {
        self.ingest = self.ingest.with_runtime(runtime);
        self
    }

    pub fn store(&self) -> &Arc<TabStore> {
        self.ingest.store()
    }

    /// See [`TelemetryIngest::report`].
    pub fn report(&self, tab: TabId, payload: TelemetryPayload) -> Option<JoinHandle<()>> {
        self.ingest.report(tab, payload)
    }

    pub fn navigation_complete(&self, tab: TabId, url: Option<&str>) {
        self.ingest.navigation_complete(tab, url);
    }

    pub fn tab_closed(&self, tab: TabId) {
        self.ingest.tab_closed(tab);
    }

    /// Apply one recorded event.
    pub fn apply(&self, event: TabEvent) -> Option<JoinHandle<()>> {
        match event.kind {
            TabEventKind::Report { payload } => return self.report(event.tab, payload),
            TabEventKind::Navigated { url } => self.navigation_complete(event.tab, url.as_deref()),
            TabEventKind::Closed => self.tab_closed(event.tab),
        }
        None
    }

    /// `getTabData`: the panel view of a tab, or `None` when nothing is known about it.
    pub fn tab_data(&self, tab: TabId) -> Option<TabDataView> {
        view::tab_data(self.store(), tab)
    }

    pub fn all_tab_data(&self) -> Vec<TabDataView> {
        view::all_tab_data(self.store())
    }
}

/// Render tab views in the specified format.
pub fn render_tabs(tabs: &[TabDataView], format: OutputFormat) -> Result<String> {
    output::render(tabs, format)
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::risk::RiskLevel;
    use crate::telemetry::{ActivityReport, TransferReport};

    const TAB: TabId = TabId(11);

    #[test]
    fn busy_page_turns_red_and_navigation_clears_it() {
        let monitor = TabMonitor::new(&Config::default());
        monitor.navigation_complete(TAB, Some("https://busy.example.net/"));
        monitor.report(
            TAB,
            TelemetryPayload::Activity(ActivityReport {
                event_loop_busy_time: Some(1500.0),
                operation_count: Some(1000.0),
                worker_count: Some(6.0),
                wasm_detected: Some(true),
                network_request_count: Some(11.0),
                memory: Some(1200.0),
                ..Default::default()
            }),
        );
        monitor.report(TAB, TelemetryPayload::Transfer(TransferReport::new(2_000_000, 10_000_000)));

        let view = monitor.tab_data(TAB).unwrap();
        assert_eq!(view.site.as_deref(), Some("busy.example.net"));
        assert_eq!(view.score, 170.0);
        assert_eq!(view.risk_level, RiskLevel::Red);
        assert_eq!(view.warnings.len(), 5);

        monitor.navigation_complete(TAB, Some("https://calm.example.net/"));
        let view = monitor.tab_data(TAB).unwrap();
        assert_eq!(view.risk_level, RiskLevel::Green);
        assert_eq!(view.data_sent + view.data_received, 0);
        assert!(view.warnings.is_empty());
    }

    #[test]
    fn closed_tab_returns_no_data() {
        let monitor = TabMonitor::new(&Config::default());
        monitor.report(TAB, TelemetryPayload::WasmDetected);
        assert!(monitor.tab_data(TAB).is_some());

        monitor.tab_closed(TAB);
        assert!(monitor.tab_data(TAB).is_none());
        assert!(monitor.all_tab_data().is_empty());
    }

    #[test]
    fn replayed_events_drive_the_monitor() {
        let events = replay::parse_events(
            r#"{"tab": 1, "event": "navigated", "url": "https://a.example/"}
{"tab": 2, "event": "report", "payload": {"type": "wasm_detected"}}
{"tab": 1, "event": "report", "payload": {"type": "worker_created", "count": 4}}
{"tab": 2, "event": "closed"}"#,
        )
        .unwrap();

        let monitor = TabMonitor::new(&Config::default());
        for event in events {
            monitor.apply(event);
        }

        let tabs = monitor.all_tab_data();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].tab_id, TabId(1));
        assert_eq!(tabs[0].worker_count, 4);
    }
}
