//! Presenter-facing view of a tab (`getTabData`).

use serde::{Deserialize, Serialize};

use crate::risk::{self, RiskLevel};
use crate::state::{MemorySource, NetworkActivityLevel, TabId, TabState};
use crate::store::TabStore;

/// Per-metric colour for the panel's indicator dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Green,
    Yellow,
    Red,
}

impl Indicator {
    fn grade(red: bool, yellow: bool) -> Self {
        if red {
            Self::Red
        } else if yellow {
            Self::Yellow
        } else {
            Self::Green
        }
    }
}

/// Indicator colours for each displayed metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicators {
    pub cpu: Indicator,
    pub memory: Indicator,
    pub network: Indicator,
    pub workers: Indicator,
    pub wasm: Indicator,
}

impl Indicators {
    pub fn for_state(state: &TabState) -> Self {
        Self {
            cpu: Indicator::grade(state.cpu_activity_score > 80.0, state.cpu_activity_score > 50.0),
            memory: Indicator::grade(state.memory_usage > 1000.0, state.memory_usage > 500.0),
            network: Indicator::grade(
                state.network_activity_level == NetworkActivityLevel::High,
                state.network_activity_level == NetworkActivityLevel::Medium,
            ),
            workers: Indicator::grade(state.worker_count > 5, state.worker_count > 2),
            wasm: Indicator::grade(state.wasm_detected, false),
        }
    }
}

/// Snapshot of one tab as the panel displays it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabDataView {
    pub tab_id: TabId,
    pub site: Option<String>,
    pub cpu_activity_score: f64,
    pub memory_usage: f64,
    pub memory_source: Option<MemorySource>,
    pub worker_count: u32,
    pub network_activity_level: NetworkActivityLevel,
    pub wasm_detected: bool,
    pub data_sent: u64,
    pub data_received: u64,
    pub risk_level: RiskLevel,
    pub score: f64,
    pub warnings: Vec<String>,
    pub indicators: Indicators,
}

impl TabDataView {
    pub fn from_state(tab_id: TabId, state: &TabState) -> Self {
        let assessment = risk::evaluate(state);
        Self {
            tab_id,
            site: state.site.clone(),
            cpu_activity_score: state.cpu_activity_score,
            memory_usage: state.memory_usage,
            memory_source: state.memory_source,
            worker_count: state.worker_count,
            network_activity_level: state.network_activity_level,
            wasm_detected: state.wasm_detected,
            data_sent: state.data_sent,
            data_received: state.data_received,
            risk_level: assessment.level,
            score: assessment.score,
            warnings: state.warnings.iter().map(ToString::to_string).collect(),
            indicators: Indicators::for_state(state),
        }
    }
}

/// `getTabData`: `None` for tabs that are unknown or already closed.
pub fn tab_data(store: &TabStore, tab: TabId) -> Option<TabDataView> {
    store
        .snapshot(tab)
        .map(|state| TabDataView::from_state(tab, &state))
}

/// Views for every live tab, in tab id order.
pub fn all_tab_data(store: &TabStore) -> Vec<TabDataView> {
    store
        .tab_ids()
        .into_iter()
        .filter_map(|tab| tab_data(store, tab))
        .collect()
}
