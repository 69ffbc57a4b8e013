//! Request and response shapes for the external generation and search
//! capabilities.

use serde::{Deserialize, Serialize};

/// Per-call knobs for the text-generation capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the model for JSON output.
    pub structured_output: bool,
}

impl GenerationOptions {
    pub fn structured(max_tokens: u32) -> Self {
        Self {
            temperature: 0.2,
            max_tokens,
            structured_output: true,
        }
    }

    pub fn prose(max_tokens: u32) -> Self {
        Self {
            temperature: 0.5,
            max_tokens,
            structured_output: false,
        }
    }
}

/// Cost units consumed and produced by external calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    #[serde(default)]
    pub calls: u64,
}

/// A completed, non-streamed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub depth: SearchDepth,
    pub max_results: usize,
}
