use crate::risk::{Factor, FactorMetadata};
use crate::state::TabState;

pub const CPU_WEIGHT: f64 = 0.6;
pub const CPU_CAP: f64 = 60.0;

/// CPU: `cpuActivityScore * 0.6`, capped at 60.
pub struct CpuFactor;

impl Factor for CpuFactor {
    fn metadata(&self) -> FactorMetadata {
        FactorMetadata {
            id: "CPU".into(),
            name: "CPU activity".into(),
            description: "Weighted share of the normalised CPU activity score".into(),
            cap: CPU_CAP,
        }
    }

    fn contribution(&self, state: &TabState) -> f64 {
        let points = state.cpu_activity_score * CPU_WEIGHT;
        if points.is_nan() {
            return 0.0;
        }
        points.clamp(0.0, CPU_CAP)
    }
}
