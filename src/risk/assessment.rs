use serde::{Deserialize, Serialize};

/// Score above which a tab is Red.
pub const RED_THRESHOLD: f64 = 120.0;
/// Score above which a tab is Yellow.
pub const YELLOW_THRESHOLD: f64 = 80.0;

/// Coarse three-level verdict shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    Green,
    Yellow,
    Red,
}

impl RiskLevel {
    /// `> 120` Red, `> 80` Yellow, otherwise Green.
    pub fn from_score(score: f64) -> Self {
        if score > RED_THRESHOLD {
            Self::Red
        } else if score > YELLOW_THRESHOLD {
            Self::Yellow
        } else {
            Self::Green
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Green => write!(f, "Green"),
            Self::Yellow => write!(f, "Yellow"),
            Self::Red => write!(f, "Red"),
        }
    }
}

/// Metadata about a scoring factor, used for `list-factors` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Most points this factor can add to the score.
    pub cap: f64,
}

/// Points one factor added to a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub factor_id: String,
    pub points: f64,
}

/// Result of evaluating one tab's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: f64,
    pub contributions: Vec<Contribution>,
}
