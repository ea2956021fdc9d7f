use crate::risk::{Factor, FactorMetadata};
use crate::state::TabState;

pub const HIGH_MEMORY_MB: f64 = 1000.0;
pub const ELEVATED_MEMORY_MB: f64 = 500.0;

/// Memory: 40 points above 1000 MB, 20 above 500 MB.
pub struct MemoryFactor;

impl Factor for MemoryFactor {
    fn metadata(&self) -> FactorMetadata {
        FactorMetadata {
            id: "MEMORY".into(),
            name: "Memory footprint".into(),
            description: "Estimated resident memory above 500 MB / 1000 MB".into(),
            cap: 40.0,
        }
    }

    fn contribution(&self, state: &TabState) -> f64 {
        if state.memory_usage > HIGH_MEMORY_MB {
            40.0
        } else if state.memory_usage > ELEVATED_MEMORY_MB {
            20.0
        } else {
            0.0
        }
    }
}
