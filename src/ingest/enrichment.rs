//! Memory/CPU enrichment tiers.
//!
//! Tiers, highest priority first: process-level reader, in-page heap reader,
//! payload-supplied memory, plausible default. Each tier is tried only when
//! the one before it produced nothing; a source that is missing, answers with
//! nothing, or exceeds the timeout simply passes control to the next tier.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::config::IngestConfig;
use crate::state::{MemorySource, TabId};
use crate::store::EnrichmentReading;
use crate::telemetry::{bytes_to_mb, non_negative};

/// Future returned by an enrichment source; `None` means "not available".
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Option<T>> + Send + 'a>>;

/// Process-level reading for the process hosting a tab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessMetrics {
    pub cpu_percent: f64,
    pub memory_bytes: u64,
}

/// Reads CPU and memory for the process hosting a tab.
pub trait ProcessMetricsSource: Send + Sync {
    fn process_metrics(&self, tab: TabId) -> SourceFuture<'_, ProcessMetrics>;
}

/// Reads the page's used JS heap size in bytes.
pub trait HeapMemorySource: Send + Sync {
    fn heap_used_bytes(&self, tab: TabId) -> SourceFuture<'_, u64>;
}

/// The asynchronous enrichment collaborators available to the ingest.
#[derive(Clone, Default)]
pub struct EnrichmentSources {
    process: Option<Arc<dyn ProcessMetricsSource>>,
    heap: Option<Arc<dyn HeapMemorySource>>,
}

impl std::fmt::Debug for EnrichmentSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentSources")
            .field("process", &self.process.is_some())
            .field("heap", &self.heap.is_some())
            .finish()
    }
}

impl EnrichmentSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(mut self, source: Arc<dyn ProcessMetricsSource>) -> Self {
        self.process = Some(source);
        self
    }

    pub fn with_heap(mut self, source: Arc<dyn HeapMemorySource>) -> Self {
        self.heap = Some(source);
        self
    }

    /// True when no asynchronous tier is configured.
    pub fn is_empty(&self) -> bool {
        self.process.is_none() && self.heap.is_none()
    }

    /// Walk the tier chain and return the first reading obtained.
    pub async fn resolve(
        &self,
        tab: TabId,
        payload_memory: Option<f64>,
        config: &IngestConfig,
    ) -> EnrichmentReading {
        let timeout = config.enrichment_timeout();

        if let Some(source) = &self.process {
            let attempt = source.process_metrics(tab);
            let metrics = bounded(tab, MemorySource::ProcessMetrics, timeout, attempt).await;
            if let Some(reading) = metrics.and_then(process_reading) {
                return reading;
            }
        }

        if let Some(source) = &self.heap {
            let attempt = source.heap_used_bytes(tab);
            let used = bounded(tab, MemorySource::PageHeap, timeout, attempt).await;
            if let Some(bytes) = used.filter(|b| *b > 0) {
                return EnrichmentReading::memory(MemorySource::PageHeap, bytes_to_mb(bytes));
            }
        }

        resolve_local(tab, payload_memory, config)
    }
}

/// The tiers that need no collaborator: payload memory, then the default estimate.
pub fn resolve_local(
    tab: TabId,
    payload_memory: Option<f64>,
    config: &IngestConfig,
) -> EnrichmentReading {
    if let Some(mb) = payload_memory {
        return EnrichmentReading::memory(MemorySource::Payload, mb);
    }
    tracing::debug!(tab = %tab, "no memory signal, using default estimate");
    EnrichmentReading::memory(MemorySource::Fallback, fallback_memory_mb(config))
}

fn fallback_memory_mb(config: &IngestConfig) -> f64 {
    let (min, max) = (config.fallback_memory_min_mb, config.fallback_memory_max_mb);
    if !min.is_finite() || !max.is_finite() || min >= max {
        return non_negative(Some(min));
    }
    rand::thread_rng().gen_range(min..=max)
}

fn process_reading(metrics: ProcessMetrics) -> Option<EnrichmentReading> {
    if !metrics.cpu_percent.is_finite() || metrics.memory_bytes == 0 {
        return None;
    }
    Some(EnrichmentReading {
        source: MemorySource::ProcessMetrics,
        memory_mb: bytes_to_mb(metrics.memory_bytes),
        cpu_percent: Some(metrics.cpu_percent),
    })
}

async fn bounded<T>(
    tab: TabId,
    tier: MemorySource,
    timeout: Duration,
    attempt: SourceFuture<'_, T>,
) -> Option<T> {
    match tokio::time::timeout(timeout, attempt).await {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            tracing::debug!(tab = %tab, tier = %tier, "enrichment source unavailable");
            None
        }
        Err(_) => {
            tracing::debug!(
                tab = %tab,
                tier = %tier,
                timeout_ms = timeout.as_millis() as u64,
                "enrichment source timed out"
            );
            None
        }
    }
}
