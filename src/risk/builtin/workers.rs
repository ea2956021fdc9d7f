use crate::risk::{Factor, FactorMetadata};
use crate::state::TabState;

/// Workers: 20 points above 5 workers, 10 above 2.
pub struct WorkerFactor;

impl Factor for WorkerFactor {
    fn metadata(&self) -> FactorMetadata {
        FactorMetadata {
            id: "WORKERS".into(),
            name: "Background workers".into(),
            description: "Cumulative workers created by the page (> 2, > 5)".into(),
            cap: 20.0,
        }
    }

    fn contribution(&self, state: &TabState) -> f64 {
        match state.worker_count {
            0..=2 => 0.0,
            3..=5 => 10.0,
            _ => 20.0,
        }
    }
}
