//! Risk evaluator: a pure function from tab state to a scored verdict.
//!
//! The composite score is the sum of independently capped factor
//! contributions (max 170). Factor weights and level thresholds are fixed.

pub mod assessment;
pub mod builtin;

use once_cell::sync::Lazy;

use crate::state::TabState;

pub use assessment::{
    Contribution, FactorMetadata, RiskAssessment, RiskLevel, RED_THRESHOLD, YELLOW_THRESHOLD,
};

/// A factor maps one aspect of a tab's state to a bounded number of points.
pub trait Factor: Send + Sync {
    /// Metadata about this factor (id, name, cap).
    fn metadata(&self) -> FactorMetadata;

    /// Points contributed by `state`, never above the factor's cap.
    fn contribution(&self, state: &TabState) -> f64;
}

/// Runs all registered factors against a state.
pub struct RiskEvaluator {
    factors: Vec<Box<dyn Factor>>,
}

impl RiskEvaluator {
    /// Create an evaluator with all built-in factors registered.
    pub fn new() -> Self {
        Self {
            factors: builtin::all_factors(),
        }
    }

    /// Score and classify a state. Does not touch the input.
    pub fn evaluate(&self, state: &TabState) -> RiskAssessment {
        let contributions: Vec<Contribution> = self
            .factors
            .iter()
            .map(|factor| Contribution {
                factor_id: factor.metadata().id,
                points: factor.contribution(state),
            })
            .collect();
        let score = contributions.iter().map(|c| c.points).sum();

        RiskAssessment {
            level: RiskLevel::from_score(score),
            score,
            contributions,
        }
    }

    /// List metadata for all registered factors.
    pub fn list_factors(&self) -> Vec<FactorMetadata> {
        self.factors.iter().map(|f| f.metadata()).collect()
    }
}

impl Default for RiskEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

static BUILTIN: Lazy<RiskEvaluator> = Lazy::new(RiskEvaluator::new);

/// Evaluate a state with the built-in factors.
pub fn evaluate(state: &TabState) -> RiskAssessment {
    BUILTIN.evaluate(state)
}
