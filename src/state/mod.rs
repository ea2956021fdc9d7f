//! Per-tab state record and the vocabulary shared by ingest and evaluation.
//!
//! A `TabState` is only ever mutated by the ingest path through the
//! `TabStore`; everything else works on snapshots.

pub mod warnings;

use std::time::Instant;

use serde::{Deserialize, Serialize};

pub use warnings::{derive_warnings, TabWarning};

/// Opaque identifier of a monitored tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request-rate bucket for one reporting interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NetworkActivityLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl NetworkActivityLevel {
    /// Low (<= 5), Medium (6-10), High (> 10) requests per interval.
    pub fn from_request_count(count: u64) -> Self {
        match count {
            0..=5 => Self::Low,
            6..=10 => Self::Medium,
            _ => Self::High,
        }
    }
}

impl std::fmt::Display for NetworkActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Enrichment tier that produced the current memory figure.
///
/// Variants are declared lowest priority first so the derived `Ord`
/// matches tier priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemorySource {
    /// Bounded pseudo-random plausible default.
    Fallback,
    /// Memory value carried by the activity report itself.
    Payload,
    /// In-page heap reader.
    PageHeap,
    /// Process-level CPU/memory reader.
    ProcessMetrics,
}

impl MemorySource {
    /// Whether this tier reflects an actual measurement.
    pub fn is_measured(self) -> bool {
        !matches!(self, Self::Fallback)
    }
}

impl std::fmt::Display for MemorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fallback => write!(f, "default"),
            Self::Payload => write!(f, "payload"),
            Self::PageHeap => write!(f, "heap"),
            Self::ProcessMetrics => write!(f, "process"),
        }
    }
}

/// Everything known about one tab's behaviour on its current page.
#[derive(Debug, Clone, PartialEq)]
pub struct TabState {
    /// Normalised CPU-like activity, 0-100.
    pub cpu_activity_score: f64,
    /// Estimated resident memory in MB.
    pub memory_usage: f64,
    pub memory_source: Option<MemorySource>,
    /// Cumulative background workers created by the page.
    pub worker_count: u32,
    pub network_activity_level: NetworkActivityLevel,
    pub data_sent: u64,
    pub data_received: u64,
    /// Sticky until the next reset.
    pub wasm_detected: bool,
    /// Recomputed from scratch on every update.
    pub warnings: Vec<TabWarning>,
    /// Host of the page, when the lifecycle layer reported one.
    pub site: Option<String>,
    pub last_update: Instant,
}

impl TabState {
    pub fn new() -> Self {
        Self {
            cpu_activity_score: 0.0,
            memory_usage: 0.0,
            memory_source: None,
            worker_count: 0,
            network_activity_level: NetworkActivityLevel::Low,
            data_sent: 0,
            data_received: 0,
            wasm_detected: false,
            warnings: Vec::new(),
            site: None,
            last_update: Instant::now(),
        }
    }

    /// Total bytes moved in either direction.
    pub fn data_transferred(&self) -> u64 {
        self.data_sent.saturating_add(self.data_received)
    }

    /// Recompute warnings and stamp the update time.
    pub fn refresh(&mut self) {
        self.warnings = derive_warnings(self);
        self.last_update = Instant::now();
    }
}

impl Default for TabState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_buckets_match_boundaries() {
        assert_eq!(NetworkActivityLevel::from_request_count(0), NetworkActivityLevel::Low);
        assert_eq!(NetworkActivityLevel::from_request_count(5), NetworkActivityLevel::Low);
        assert_eq!(NetworkActivityLevel::from_request_count(6), NetworkActivityLevel::Medium);
        assert_eq!(NetworkActivityLevel::from_request_count(10), NetworkActivityLevel::Medium);
        assert_eq!(NetworkActivityLevel::from_request_count(11), NetworkActivityLevel::High);
    }

    #[test]
    fn memory_source_order_is_tier_priority() {
        assert!(MemorySource::ProcessMetrics > MemorySource::PageHeap);
        assert!(MemorySource::PageHeap > MemorySource::Payload);
        assert!(MemorySource::Payload > MemorySource::Fallback);
        assert!(!MemorySource::Fallback.is_measured());
    }

    #[test]
    fn fresh_state_is_zeroed() {
        let state = TabState::new();
        assert_eq!(state.cpu_activity_score, 0.0);
        assert_eq!(state.data_transferred(), 0);
        assert!(!state.wasm_detected);
        assert!(state.warnings.is_empty());
    }

    #[test]
    fn data_transferred_saturates() {
        let state = TabState {
            data_sent: u64::MAX,
            data_received: 10,
            ..TabState::new()
        };
        assert_eq!(state.data_transferred(), u64::MAX);
    }
}
