use super::{NetworkActivityLevel, TabState};

pub const CPU_WARNING_THRESHOLD: f64 = 70.0;
pub const MEMORY_WARNING_THRESHOLD_MB: f64 = 1000.0;
pub const WORKER_WARNING_THRESHOLD: u32 = 3;

/// A human-readable alert shown in the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabWarning {
    HighCpu,
    HighMemory,
    MultipleWorkers,
    WasmActive,
    HighNetwork,
}

impl TabWarning {
    pub fn message(self) -> &'static str {
        match self {
            Self::HighCpu => "High CPU usage detected",
            Self::HighMemory => "High memory usage detected",
            Self::MultipleWorkers => "Multiple background workers running",
            Self::WasmActive => "WebAssembly execution active",
            Self::HighNetwork => "High network activity",
        }
    }
}

impl std::fmt::Display for TabWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Derive the warning list for a state, in display order.
pub fn derive_warnings(state: &TabState) -> Vec<TabWarning> {
    let checks = [
        (state.cpu_activity_score > CPU_WARNING_THRESHOLD, TabWarning::HighCpu),
        (state.memory_usage > MEMORY_WARNING_THRESHOLD_MB, TabWarning::HighMemory),
        (state.worker_count > WORKER_WARNING_THRESHOLD, TabWarning::MultipleWorkers),
        (state.wasm_detected, TabWarning::WasmActive),
        (
            state.network_activity_level == NetworkActivityLevel::High,
            TabWarning::HighNetwork,
        ),
    ];

    checks
        .into_iter()
        .filter_map(|(hit, warning)| hit.then_some(warning))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_tab_has_no_warnings() {
        assert!(derive_warnings(&TabState::new()).is_empty());
    }

    #[test]
    fn thresholds_are_strict() {
        let state = TabState {
            cpu_activity_score: 70.0,
            memory_usage: 1000.0,
            worker_count: 3,
            ..TabState::new()
        };
        assert!(derive_warnings(&state).is_empty());
    }

    #[test]
    fn all_warnings_in_display_order() {
        let state = TabState {
            cpu_activity_score: 90.0,
            memory_usage: 1200.0,
            worker_count: 6,
            wasm_detected: true,
            network_activity_level: NetworkActivityLevel::High,
            ..TabState::new()
        };
        let messages: Vec<&str> = derive_warnings(&state).into_iter().map(TabWarning::message).collect();
        assert_eq!(
            messages,
            vec![
                "High CPU usage detected",
                "High memory usage detected",
                "Multiple background workers running",
                "WebAssembly execution active",
                "High network activity",
            ]
        );
    }
}
