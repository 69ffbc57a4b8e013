//! Routing plan and analysis types produced by the early stages.

use serde::{Deserialize, Serialize};

use crate::stage::StageKind;

/// Coarse category of the question, chosen by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    News,
    Research,
    Technical,
    General,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::News => "news",
            Topic::Research => "research",
            Topic::Technical => "technical",
            Topic::General => "general",
        }
    }
}

/// The plan created once by the Plan stage and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterPlan {
    pub use_web: bool,
    pub topic: Topic,
    /// Stages that will run for this question, in order.
    pub step_sequence: Vec<StageKind>,
    /// Upper bound on critique rounds.
    pub max_iterations: u32,
    /// Search queries; the first is always the question itself.
    pub queries: Vec<String>,
}

/// Intermediate synthesis produced by the Analyze stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub key_points: Vec<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
}
