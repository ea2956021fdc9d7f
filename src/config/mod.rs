use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SentinelError};

/// Top-level configuration from `.tabsentinel.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Tunables for telemetry normalisation and enrichment.
///
/// Scoring weights and risk thresholds are fixed and deliberately absent here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestConfig {
    /// Event-loop busy time (ms) per reporting interval that maps to a ratio of 100.
    #[serde(default = "default_event_loop_reference_ms")]
    pub event_loop_reference_ms: f64,
    /// Operations per reporting interval that map to a rate of 100.
    #[serde(default = "default_operation_reference_count")]
    pub operation_reference_count: f64,
    /// Upper bound on a single enrichment tier attempt.
    #[serde(default = "default_enrichment_timeout_ms")]
    pub enrichment_timeout_ms: u64,
    /// Lower bound of the plausible default memory estimate (MB).
    #[serde(default = "default_fallback_memory_min_mb")]
    pub fallback_memory_min_mb: f64,
    /// Upper bound of the plausible default memory estimate (MB).
    #[serde(default = "default_fallback_memory_max_mb")]
    pub fallback_memory_max_mb: f64,
}

fn default_event_loop_reference_ms() -> f64 {
    1000.0
}

fn default_operation_reference_count() -> f64 {
    1000.0
}

fn default_enrichment_timeout_ms() -> u64 {
    500
}

fn default_fallback_memory_min_mb() -> f64 {
    100.0
}

fn default_fallback_memory_max_mb() -> f64 {
    600.0
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            event_loop_reference_ms: default_event_loop_reference_ms(),
            operation_reference_count: default_operation_reference_count(),
            enrichment_timeout_ms: default_enrichment_timeout_ms(),
            fallback_memory_min_mb: default_fallback_memory_min_mb(),
            fallback_memory_max_mb: default_fallback_memory_max_mb(),
        }
    }
}

impl IngestConfig {
    pub fn enrichment_timeout(&self) -> Duration {
        Duration::from_millis(self.enrichment_timeout_ms)
    }

    /// Reject values that would make normalisation or the fallback draw meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(self.event_loop_reference_ms.is_finite() && self.event_loop_reference_ms > 0.0) {
            return Err(SentinelError::Config(format!(
                "event_loop_reference_ms must be positive, got {}",
                self.event_loop_reference_ms
            )));
        }
        if !(self.operation_reference_count.is_finite() && self.operation_reference_count > 0.0) {
            return Err(SentinelError::Config(format!(
                "operation_reference_count must be positive, got {}",
                self.operation_reference_count
            )));
        }
        let (min, max) = (self.fallback_memory_min_mb, self.fallback_memory_max_mb);
        if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
            return Err(SentinelError::Config(format!(
                "fallback memory range [{}, {}] is invalid",
                min, max
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.ingest.validate()?;
        Ok(config)
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# tab-sentinel configuration

[ingest]
# Event-loop busy time (ms) per reporting interval treated as full load.
event_loop_reference_ms = 1000.0

# Page operations (DOM work, timers) per reporting interval treated as full load.
operation_reference_count = 1000.0

# Maximum time a single enrichment source may take before falling back.
enrichment_timeout_ms = 500

# Range of the plausible memory estimate used when no real reading exists.
fallback_memory_min_mb = 100.0
fallback_memory_max_mb = 600.0
"#
    }
}
