//! # sift-credibility
//!
//! Heuristic credibility scoring for retrieved evidence.
//!
//! - [`scoring`] holds the pure formulas: source quality, fact checking,
//!   claim cross-validation, uncertainty and the weighted overall score.
//! - [`classifier::KeywordClassifier`] is the default `TextClassifier`.
//! - [`engine::CredibilityEvaluator`] adds the shared verdict cache and the
//!   bounded executor on top of the formulas.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use sift_credibility::{CredibilityEvaluator, KeywordClassifier};
//!
//! let evaluator = CredibilityEvaluator::new(
//!     Arc::new(KeywordClassifier::new()),
//!     ResultCache::shared(Duration::from_secs(600), 256),
//!     Arc::new(BoundedExecutor::new(4)),
//! );
//! let report = evaluator.evaluate(&draft, &sources, &facts).await?;
//! ```

pub mod classifier;
pub mod engine;
pub mod scoring;

pub use classifier::KeywordClassifier;
pub use engine::CredibilityEvaluator;
