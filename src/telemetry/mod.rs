//! Inbound telemetry payloads from the page observer and the network layer.
//!
//! Every numeric field is optional and read leniently: a missing, null,
//! mistyped, negative or non-finite value reads as zero/absent instead of
//! rejecting the whole report.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::IngestConfig;

pub const EVENT_LOOP_WEIGHT: f64 = 0.7;
pub const OPERATION_WEIGHT: f64 = 0.3;
pub const MAX_CPU_ACTIVITY_SCORE: f64 = 100.0;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One report from the page observer or the network layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryPayload {
    /// Periodic activity sample.
    #[serde(alias = "metrics")]
    Activity(ActivityReport),
    /// Request/response byte counts for one transfer.
    Transfer(TransferReport),
    /// The page instantiated a WebAssembly module.
    WasmDetected,
    /// The page created a worker; carries its cumulative worker count.
    WorkerCreated {
        #[serde(default, deserialize_with = "lenient")]
        count: Option<f64>,
    },
}

/// Activity sample covering one reporting interval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    /// Event-loop busy time in milliseconds.
    #[serde(default, deserialize_with = "lenient")]
    pub event_loop_busy_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub operation_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub timer_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub worker_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub wasm_detected: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub network_request_count: Option<f64>,
    /// Memory in MB as seen by the page, if it could tell.
    #[serde(default, deserialize_with = "lenient")]
    pub memory: Option<f64>,
}

impl ActivityReport {
    pub fn busy_ms(&self) -> f64 {
        non_negative(self.event_loop_busy_time)
    }

    /// DOM operations plus scheduled timers.
    pub fn operations(&self) -> f64 {
        non_negative(self.operation_count) + non_negative(self.timer_count)
    }

    pub fn workers(&self) -> u32 {
        to_count(self.worker_count).min(u64::from(u32::MAX)) as u32
    }

    pub fn wasm(&self) -> bool {
        self.wasm_detected.unwrap_or(false)
    }

    pub fn requests(&self) -> u64 {
        to_count(self.network_request_count)
    }

    /// Payload-supplied memory; zero counts as "no reading".
    pub fn memory_mb(&self) -> Option<f64> {
        self.memory.filter(|m| m.is_finite() && *m > 0.0)
    }

    /// `0.7 * busy ratio + 0.3 * operation rate`, each normalised to 100 at the
    /// configured reference rate and capped there.
    pub fn cpu_activity_score(&self, config: &IngestConfig) -> f64 {
        let busy_ratio = normalised(self.busy_ms(), config.event_loop_reference_ms);
        let operation_rate = normalised(self.operations(), config.operation_reference_count);
        let combined = EVENT_LOOP_WEIGHT * busy_ratio + OPERATION_WEIGHT * operation_rate;
        if combined.is_finite() {
            combined.clamp(0.0, MAX_CPU_ACTIVITY_SCORE)
        } else {
            0.0
        }
    }
}

/// Byte counts for a single transfer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReport {
    #[serde(default, deserialize_with = "lenient_count")]
    pub request_size: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub response_size: Option<u64>,
}

impl TransferReport {
    pub fn new(request_size: u64, response_size: u64) -> Self {
        Self {
            request_size: Some(request_size),
            response_size: Some(response_size),
        }
    }

    pub fn sent(&self) -> u64 {
        self.request_size.unwrap_or(0)
    }

    pub fn received(&self) -> u64 {
        self.response_size.unwrap_or(0)
    }
}

/// Convert a byte count from an external reader to MB.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Clamp an untrusted reading to a finite, non-negative value.
pub fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

fn normalised(value: f64, reference: f64) -> f64 {
    let ratio = value / reference * 100.0;
    if ratio.is_nan() {
        0.0
    } else {
        ratio.min(MAX_CPU_ACTIVITY_SCORE)
    }
}

fn to_count(value: Option<f64>) -> u64 {
    // Float-to-int `as` saturates at u64::MAX.
    non_negative(value).floor() as u64
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(T),
    Other(IgnoredAny),
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Value(v) => Some(v),
        Lenient::Other(_) => None,
    })
}

/// Byte counts arrive as integers from the network layer but may be floats
/// (or garbage) from the page.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientCount {
    Exact(u64),
    Approximate(f64),
    Other(IgnoredAny),
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LenientCount::deserialize(deserializer)? {
        LenientCount::Exact(v) => Some(v),
        LenientCount::Approximate(v) => Some(to_count(Some(v))),
        LenientCount::Other(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IngestConfig {
        IngestConfig::default()
    }

    #[test]
    fn original_metrics_message_parses() {
        let payload: TelemetryPayload = serde_json::from_str(
            r#"{"type":"metrics","eventLoopBusyTime":500,"timerCount":12,
                "workerCount":2,"wasmDetected":true,"networkRequestCount":7}"#,
        )
        .unwrap();
        let TelemetryPayload::Activity(report) = payload else {
            panic!("expected activity report");
        };
        assert_eq!(report.busy_ms(), 500.0);
        assert_eq!(report.operations(), 12.0);
        assert_eq!(report.workers(), 2);
        assert!(report.wasm());
        assert_eq!(report.requests(), 7);
        assert_eq!(report.memory_mb(), None);
    }

    #[test]
    fn malformed_fields_read_as_zero() {
        let payload: TelemetryPayload = serde_json::from_str(
            r#"{"type":"activity","eventLoopBusyTime":"lots","workerCount":-4,
                "networkRequestCount":null,"wasmDetected":"yes","memory":-1}"#,
        )
        .unwrap();
        let TelemetryPayload::Activity(report) = payload else {
            panic!("expected activity report");
        };
        assert_eq!(report.busy_ms(), 0.0);
        assert_eq!(report.workers(), 0);
        assert_eq!(report.requests(), 0);
        assert!(!report.wasm());
        assert_eq!(report.memory_mb(), None);
        assert_eq!(report.cpu_activity_score(&config()), 0.0);
    }

    #[test]
    fn cpu_score_weights_busy_time_and_operations() {
        let report = ActivityReport {
            event_loop_busy_time: Some(500.0),
            operation_count: Some(500.0),
            ..Default::default()
        };
        // 0.7 * 50 + 0.3 * 50
        assert!((report.cpu_activity_score(&config()) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn each_cpu_input_is_capped_before_weighting() {
        let operations_only = ActivityReport {
            event_loop_busy_time: Some(0.0),
            operation_count: Some(10_000.0),
            ..Default::default()
        };
        assert!((operations_only.cpu_activity_score(&config()) - 30.0).abs() < 1e-9);

        let busy_only = ActivityReport {
            event_loop_busy_time: Some(50_000.0),
            ..Default::default()
        };
        assert!((busy_only.cpu_activity_score(&config()) - 70.0).abs() < 1e-9);
    }

    #[test]
    fn cpu_score_is_capped_at_100() {
        let report = ActivityReport {
            event_loop_busy_time: Some(10_000.0),
            operation_count: Some(1e12),
            ..Default::default()
        };
        assert_eq!(report.cpu_activity_score(&config()), 100.0);
    }

    #[test]
    fn transfer_and_one_shot_signals_parse() {
        let transfer: TelemetryPayload =
            serde_json::from_str(r#"{"type":"transfer","requestSize":120}"#).unwrap();
        assert_eq!(
            transfer,
            TelemetryPayload::Transfer(TransferReport {
                request_size: Some(120),
                response_size: None,
            })
        );

        let odd: TelemetryPayload = serde_json::from_str(
            r#"{"type":"transfer","requestSize":-50,"responseSize":"big"}"#,
        )
        .unwrap();
        let TelemetryPayload::Transfer(odd) = odd else {
            panic!("expected transfer report");
        };
        assert_eq!((odd.sent(), odd.received()), (0, 0));

        let wasm: TelemetryPayload = serde_json::from_str(r#"{"type":"wasm_detected"}"#).unwrap();
        assert_eq!(wasm, TelemetryPayload::WasmDetected);

        let worker: TelemetryPayload =
            serde_json::from_str(r#"{"type":"worker_created","count":4}"#).unwrap();
        assert_eq!(worker, TelemetryPayload::WorkerCreated { count: Some(4.0) });
    }

    #[test]
    fn large_byte_counts_are_exact() {
        let payload: TelemetryPayload = serde_json::from_str(
            r#"{"type":"transfer","requestSize":9007199254740993,"responseSize":2048.9}"#,
        )
        .unwrap();
        let TelemetryPayload::Transfer(transfer) = payload else {
            panic!("expected transfer report");
        };
        assert_eq!(transfer.sent(), 9_007_199_254_740_993);
        assert_eq!(transfer.received(), 2048);
    }

    #[test]
    fn bytes_convert_to_mebibytes() {
        assert_eq!(bytes_to_mb(750 * 1024 * 1024), 750.0);
    }
}
