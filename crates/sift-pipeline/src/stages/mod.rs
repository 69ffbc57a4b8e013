//! The seven pipeline stages.
//!
//! Each stage module exposes an async primary (what the stage does when it
//! has time) and a synchronous fallback (what the run uses when the slice
//! expires or the primary fails). The orchestrator pairs them through the
//! scheduler; stages never touch deadlines themselves.

pub mod analyze;
pub mod critique;
pub mod extract;
pub mod plan;
pub mod retrieve;
pub mod verify;
pub mod write;

use std::sync::Arc;

use sift_config::ModePreset;
use sift_contracts::{
    error::SiftResult,
    event::PipelineEvent,
    generation::GenerationOptions,
    run::RunConfig,
    source::Source,
};
use sift_core::{
    cache::SharedCache,
    executor::BoundedExecutor,
    tokens::TokenAccountant,
    traits::{EventSink, SearchProvider, TextGenerator},
};
use sift_credibility::CredibilityEvaluator;

use crate::prompts::PromptRole;

/// Everything a stage may read or call during one run.
pub struct StageContext<'a> {
    pub question: &'a str,
    pub config: &'a RunConfig,
    pub preset: &'a ModePreset,
    pub generator: &'a Arc<dyn TextGenerator>,
    pub search: &'a Arc<dyn SearchProvider>,
    pub executor: &'a Arc<BoundedExecutor>,
    /// Searches submitted per executor batch.
    pub batch_size: usize,
    pub search_cache: &'a SharedCache<Vec<Source>>,
    pub evaluator: &'a CredibilityEvaluator,
    pub tokens: &'a TokenAccountant,
    pub sink: &'a dyn EventSink,
}

impl StageContext<'_> {
    /// One non-streamed generation call in `role`, with usage tallied.
    pub async fn generate(
        &self,
        role: PromptRole,
        user_prompt: &str,
        options: GenerationOptions,
    ) -> SiftResult<String> {
        let system_prompt = role.system_prompt(&self.config.language);
        let generation = self
            .generator
            .generate(&system_prompt, user_prompt, &options)
            .await?;
        self.tokens.record(generation.usage);
        Ok(generation.text)
    }

    pub fn emit(&self, event: PipelineEvent) {
        self.sink.emit(event);
    }
}
