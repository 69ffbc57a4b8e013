//! Configuration schema.
//!
//! A `SiftConfig` is deserialized from TOML. Every section and field has a
//! default, so an empty document is a valid offline configuration.
//!
//! Example:
//! ```toml
//! [run]
//! speed_mode = "fast"
//! language = "en"
//! deadline_ms = 30000    # 0 = no deadline
//!
//! [retrieval]
//! top_k = 6
//! max_per_domain = 2
//!
//! [provider]
//! kind = "remote"
//! generation_api_key = "..."
//! ```

use serde::{Deserialize, Serialize};

use sift_contracts::{
    run::{RetrievalSettings, RunConfig},
    stage::SpeedMode,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    pub speed_mode: SpeedMode,
    pub language: String,
    pub use_web: bool,
    /// Global deadline in milliseconds. Zero disables the deadline.
    pub deadline_ms: u64,
    pub query_expansion: bool,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            speed_mode: SpeedMode::Balanced,
            language: "en".to_string(),
            use_web: true,
            deadline_ms: 60_000,
            query_expansion: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub ttl_secs: u64,
    pub capacity: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: 600,
            capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSection {
    /// Maximum concurrently running external calls.
    pub concurrency: usize,
    /// Batch size for batched submissions.
    pub batch_size: usize,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            concurrency: 4,
            batch_size: 4,
        }
    }
}

/// Which generation/search backend the host wires in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Deterministic in-process collaborators. Needs no credentials.
    #[default]
    Offline,
    /// A remote generation service; requires `generation_api_key`.
    Remote,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub kind: ProviderKind,
    pub endpoint: Option<String>,
    pub generation_api_key: Option<String>,
    /// Without it, web search returns no results.
    pub search_api_key: Option<String>,
}

/// The top-level structure deserialized from a sift TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    pub run: RunSection,
    pub retrieval: RetrievalSettings,
    pub cache: CacheSection,
    pub executor: ExecutorSection,
    pub provider: ProviderSection,
}

impl SiftConfig {
    /// Per-run settings handed to the orchestrator.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            speed_mode: self.run.speed_mode,
            language: self.run.language.clone(),
            use_web: self.run.use_web,
            deadline_ms: (self.run.deadline_ms > 0).then_some(self.run.deadline_ms),
            query_expansion: self.run.query_expansion,
            retrieval: self.retrieval,
        }
    }
}
