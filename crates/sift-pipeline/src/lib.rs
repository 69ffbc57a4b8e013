//! # sift-pipeline
//!
//! The research pipeline orchestrator and its stages.
//!
//! ## Overview
//!
//! [`Orchestrator`] answers one question per run:
//!
//! 1. **Plan**: route the question to a topic and optionally expand its
//!    search queries.
//! 2. **Retrieve**: search every query on the shared executor, then dedupe,
//!    score and diversify the results.
//! 3. **Extract**: turn source snippets into citable facts.
//! 4. **Analyze**: condense facts into key points and open gaps.
//! 5. **Write**: stream the draft, emitting every delta.
//! 6. **Verify**: score the draft's credibility (balanced and thorough).
//! 7. **Critique**: review and rewrite in rounds while budget remains.
//!
//! Every stage has a fallback. A stage that is too slow or fails is replaced
//! by it and reported through a `diagnostic` event, so a run always ends in
//! `complete` unless the caller cancels it.
//!
//! [`offline`] holds deterministic collaborators used by the demo binary and
//! the tests below. All of their content is fictional.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! let orchestrator = Orchestrator::from_config(&config, generator, search);
//! let outcome = orchestrator
//!     .run("today's AI hardware news", &config.run_config(), &sink, &cancel)
//!     .await?;
//! ```

pub mod offline;
pub mod orchestrator;
pub mod parse;
pub mod prompts;
pub mod stages;

pub use offline::{FixtureSearch, OfflineGenerator};
pub use orchestrator::{Orchestrator, RunOutcome, StageRecord};
pub use parse::{ExtractionStrategy, StructuredParser};
pub use prompts::PromptRole;

// ── End-to-end tests ──────────────────────────────────────────────────────────
