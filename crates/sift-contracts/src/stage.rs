//! Stage identities, speed modes and per-stage time budgets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SiftError;

/// One phase of the fixed research pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Plan,
    Retrieve,
    Extract,
    Analyze,
    Write,
    Verify,
    Critique,
}

impl StageKind {
    /// Every stage in pipeline order.
    pub const ALL: [StageKind; 7] = [
        StageKind::Plan,
        StageKind::Retrieve,
        StageKind::Extract,
        StageKind::Analyze,
        StageKind::Write,
        StageKind::Verify,
        StageKind::Critique,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Plan => "plan",
            StageKind::Retrieve => "retrieve",
            StageKind::Extract => "extract",
            StageKind::Analyze => "analyze",
            StageKind::Write => "write",
            StageKind::Verify => "verify",
            StageKind::Critique => "critique",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trade-off between latency and depth selected per run.
///
/// Selects the ratio preset for every stage and which optional stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedMode {
    Fast,
    #[default]
    Balanced,
    Thorough,
}

impl SpeedMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SpeedMode::Fast => "fast",
            SpeedMode::Balanced => "balanced",
            SpeedMode::Thorough => "thorough",
        }
    }
}

impl fmt::Display for SpeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpeedMode {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(SpeedMode::Fast),
            "balanced" => Ok(SpeedMode::Balanced),
            "thorough" => Ok(SpeedMode::Thorough),
            other => Err(SiftError::FatalConfig {
                reason: format!("unknown speed mode '{other}' (expected fast, balanced or thorough)"),
            }),
        }
    }
}

/// The share of remaining deadline time a stage may use.
///
/// `slice = max(min_ms, floor(remaining * ratio))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageBudget {
    pub ratio: f64,
    pub min_ms: u64,
}

impl StageBudget {
    pub const fn new(ratio: f64, min_ms: u64) -> Self {
        Self { ratio, min_ms }
    }
}

/// Which branch of the scheduler race produced a stage's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePath {
    /// The primary task finished inside its slice.
    Primary,
    /// The slice expired and the fallback value was substituted.
    Fallback,
    /// The primary task failed and the orchestrator substituted a default.
    Degraded,
    /// The stage did not run for this mode or plan.
    Skipped,
}
