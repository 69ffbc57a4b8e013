//! Speed-mode presets: per-stage budgets and which optional stages run.

use sift_contracts::stage::{SpeedMode, StageBudget, StageKind};

/// Everything a speed mode decides about a run's shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModePreset {
    pub mode: SpeedMode,
    pub plan: StageBudget,
    pub retrieve: StageBudget,
    pub extract: StageBudget,
    pub analyze: StageBudget,
    pub write: StageBudget,
    /// `None` when the mode skips verification.
    pub verify: Option<StageBudget>,
    /// `None` when the mode skips critique.
    pub critique: Option<StageBudget>,
    /// Iteration cap written into the router plan; bounds critique rounds.
    pub max_iterations: u32,
    /// Critique stops early once less than this remains of the deadline.
    pub safety_margin_ms: u64,
}

impl ModePreset {
    pub const FAST: ModePreset = ModePreset {
        mode: SpeedMode::Fast,
        plan: StageBudget::new(0.10, 800),
        retrieve: StageBudget::new(0.30, 1_500),
        extract: StageBudget::new(0.25, 1_200),
        analyze: StageBudget::new(0.15, 800),
        write: StageBudget::new(0.60, 2_000),
        verify: None,
        critique: None,
        max_iterations: 1,
        safety_margin_ms: 1_500,
    };

    pub const BALANCED: ModePreset = ModePreset {
        mode: SpeedMode::Balanced,
        plan: StageBudget::new(0.08, 1_000),
        retrieve: StageBudget::new(0.25, 2_000),
        extract: StageBudget::new(0.25, 1_500),
        analyze: StageBudget::new(0.15, 1_000),
        write: StageBudget::new(0.50, 3_000),
        verify: Some(StageBudget::new(0.30, 1_000)),
        critique: Some(StageBudget::new(0.50, 1_500)),
        max_iterations: 2,
        safety_margin_ms: 1_500,
    };

    pub const THOROUGH: ModePreset = ModePreset {
        mode: SpeedMode::Thorough,
        plan: StageBudget::new(0.08, 1_500),
        retrieve: StageBudget::new(0.30, 3_000),
        extract: StageBudget::new(0.30, 2_500),
        analyze: StageBudget::new(0.20, 1_500),
        write: StageBudget::new(0.50, 5_000),
        verify: Some(StageBudget::new(0.40, 2_000)),
        critique: Some(StageBudget::new(0.50, 2_500)),
        max_iterations: 3,
        safety_margin_ms: 1_500,
    };

    pub fn for_mode(mode: SpeedMode) -> Self {
        match mode {
            SpeedMode::Fast => Self::FAST,
            SpeedMode::Balanced => Self::BALANCED,
            SpeedMode::Thorough => Self::THOROUGH,
        }
    }

    /// Budget for `stage`, or `None` if this mode skips it.
    pub fn budget(&self, stage: StageKind) -> Option<StageBudget> {
        match stage {
            StageKind::Plan => Some(self.plan),
            StageKind::Retrieve => Some(self.retrieve),
            StageKind::Extract => Some(self.extract),
            StageKind::Analyze => Some(self.analyze),
            StageKind::Write => Some(self.write),
            StageKind::Verify => self.verify,
            StageKind::Critique => self.critique,
        }
    }

    pub fn verifies(&self) -> bool {
        self.verify.is_some()
    }

    /// Replace every stage's `min_ms`, keeping the ratios.
    pub fn with_min_ms(mut self, min_ms: u64) -> Self {
        for budget in [
            &mut self.plan,
            &mut self.retrieve,
            &mut self.extract,
            &mut self.analyze,
            &mut self.write,
        ] {
            budget.min_ms = min_ms;
        }
        for budget in [&mut self.verify, &mut self.critique].into_iter().flatten() {
            budget.min_ms = min_ms;
        }
        self
    }
}

impl Default for ModePreset {
    fn default() -> Self {
        Self::BALANCED
    }
}
