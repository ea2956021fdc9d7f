use crate::risk::{Factor, FactorMetadata};
use crate::state::{NetworkActivityLevel, TabState};

/// Network: 20 points for High request rate, 10 for Medium.
pub struct NetworkFactor;

impl Factor for NetworkFactor {
    fn metadata(&self) -> FactorMetadata {
        FactorMetadata {
            id: "NETWORK".into(),
            name: "Request rate".into(),
            description: "Requests per reporting interval (Medium 6-10, High > 10)".into(),
            cap: 20.0,
        }
    }

    fn contribution(&self, state: &TabState) -> f64 {
        match state.network_activity_level {
            NetworkActivityLevel::High => 20.0,
            NetworkActivityLevel::Medium => 10.0,
            NetworkActivityLevel::Low => 0.0,
        }
    }
}
