//! Runtime error types for the sift research pipeline.
//!
//! All fallible operations return `SiftResult<T>`. Most variants are
//! recovered locally by the orchestrator (a diagnostic is emitted and a
//! degraded default substituted); only `FatalConfig` and `Cancelled` end a run.

use thiserror::Error;

/// The unified error type for the sift workspace.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SiftError {
    /// A stage exceeded its deadline slice. Soft: the fallback is used.
    #[error("stage '{stage}' timed out after {slice_ms}ms")]
    StageTimeout { stage: String, slice_ms: u64 },

    /// A stage's primary task failed before its slice expired.
    #[error("stage '{stage}' failed: {reason}")]
    StageFailure { stage: String, reason: String },

    /// Model output could not be turned into the expected structure by any
    /// extraction strategy.
    #[error("could not parse structured output: {reason}")]
    ParseFailure { reason: String },

    /// A required configuration value or credential is missing or invalid.
    ///
    /// Raised before any stage starts; the run never begins.
    #[error("fatal configuration error: {reason}")]
    FatalConfig { reason: String },

    /// The run was cancelled by an external signal (e.g. client disconnect).
    #[error("run cancelled during stage '{stage}'")]
    Cancelled { stage: String },

    /// The text-generation capability rejected the call due to rate limits.
    #[error("generation rate limited: {reason}")]
    RateLimited { reason: String },

    /// The text-generation capability did not answer in time.
    #[error("generation timed out: {reason}")]
    GenerationTimeout { reason: String },

    /// The text-generation capability rejected the request as malformed.
    #[error("invalid generation request: {reason}")]
    InvalidRequest { reason: String },

    /// A task submitted to the bounded executor panicked or was aborted.
    #[error("task aborted: {reason}")]
    TaskAborted { reason: String },
}

impl SiftError {
    /// True for errors that must abort the whole run instead of degrading.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SiftError::FatalConfig { .. } | SiftError::Cancelled { .. })
    }
}

/// Convenience alias used throughout the sift crates.
pub type SiftResult<T> = Result<T, SiftError>;
