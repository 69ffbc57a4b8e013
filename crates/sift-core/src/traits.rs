//! Collaborator trait definitions for the sift pipeline.
//!
//! These traits define the boundary between the pipeline core and the
//! outside world:
//!
//! - `TextGenerator`  — external text generation (may be an LLM API)
//! - `SearchProvider` — external web search; never errors
//! - `EventSink`      — receives every stage event in pipeline order
//! - `TextClassifier` — topic and sentiment heuristics used by the
//!   credibility engine; swappable without touching the scoring formulas
//!
//! The orchestrator only ever talks to these traits, so tests and the demo
//! can wire in deterministic implementations.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use sift_contracts::{
    error::SiftResult,
    event::PipelineEvent,
    generation::{Generation, GenerationOptions, SearchOptions},
    source::Source,
};

/// A stream of text deltas in generation order.
pub type DeltaStream = BoxStream<'static, SiftResult<String>>;

/// The external text-generation capability.
///
/// Implementations may fail with `RateLimited`, `GenerationTimeout` or
/// `InvalidRequest`. Dropping the returned future must stop the call.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a complete response for the given prompts.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> SiftResult<Generation>;

    /// Produce the response as an ordered stream of text deltas.
    async fn generate_stream(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> SiftResult<DeltaStream>;
}

/// The external search capability.
///
/// Returns an empty list when unconfigured or when the provider fails.
/// Callers cannot and must not distinguish "no results" from "unavailable".
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, options: &SearchOptions) -> Vec<Source>;
}

/// Receives structured events at every stage boundary and for every
/// streamed chunk.
///
/// Implementations must be cheap; the orchestrator calls `emit` inline.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Coarse topic buckets used by the cross-validation topic match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicBucket {
    Technology,
    Health,
    Finance,
    Politics,
    Science,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Text classification heuristics consumed by the credibility engine.
pub trait TextClassifier: Send + Sync {
    fn classify_topic(&self, text: &str) -> TopicBucket;
    fn classify_sentiment(&self, text: &str) -> Sentiment;
}

/// An `EventSink` that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: PipelineEvent) {}
}
