//! Run identity and the configuration surface consumed by the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stage::SpeedMode;

/// Unique identifier for one pipeline run. Appears in every trace record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Knobs for the Retrieve stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Target number of sources after diversification.
    pub top_k: usize,
    /// Results requested from the search capability per query.
    pub max_results: usize,
    pub max_per_domain: usize,
    /// Minimum number of non-CJK sources the diversifier tries to keep.
    pub min_foreign_sources: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 6,
            max_results: 8,
            max_per_domain: 2,
            min_foreign_sources: 2,
        }
    }
}

/// Per-run settings. Built by `sift-config` or directly by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub speed_mode: SpeedMode,
    /// Output language code, e.g. "en" or "zh".
    pub language: String,
    pub use_web: bool,
    /// Global deadline relative to run start. `None` means unbounded.
    pub deadline_ms: Option<u64>,
    pub query_expansion: bool,
    pub retrieval: RetrievalSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            speed_mode: SpeedMode::Balanced,
            language: "en".to_string(),
            use_web: true,
            deadline_ms: Some(60_000),
            query_expansion: true,
            retrieval: RetrievalSettings::default(),
        }
    }
}
