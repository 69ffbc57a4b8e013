//! Credibility evaluator for the sift pipeline.
//!
//! `CredibilityEvaluator` wraps the pure formulas in [`crate::scoring`] with
//! the two shared resources a run needs:
//!
//! 1. **Cache**: per-claim verdicts are stored in a `ResultCache` keyed by
//!    the claim and the sorted source URLs, so repeated checks of the same
//!    claim against the same evidence are free.
//! 2. **Executor**: cache misses are scored on the shared `BoundedExecutor`,
//!    one task per claim. Dropping `cross_validate` aborts outstanding tasks.
//!
//! The evaluator never owns the cache or executor; both are created once by
//! the host and passed in.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use sift_contracts::{
    credibility::{CredibilityReport, CrossValidationResult},
    error::SiftResult,
    source::{Fact, Source},
};
use sift_core::{
    cache::{cache_key, SharedCache},
    executor::{BoundedExecutor, TaskHandle},
    traits::TextClassifier,
};

use crate::scoring;

/// Scores claims and evidence, caching per-claim verdicts.
pub struct CredibilityEvaluator {
    classifier: Arc<dyn TextClassifier>,
    cache: SharedCache<CrossValidationResult>,
    executor: Arc<BoundedExecutor>,
}

/// A claim that is either answered from cache or still being scored.
enum Pending {
    Cached(CrossValidationResult),
    Scoring { key: String, handle: TaskHandle<CrossValidationResult> },
}

impl CredibilityEvaluator {
    pub fn new(
        classifier: Arc<dyn TextClassifier>,
        cache: SharedCache<CrossValidationResult>,
        executor: Arc<BoundedExecutor>,
    ) -> Self {
        Self {
            classifier,
            cache,
            executor,
        }
    }

    /// Split a draft into the claims `evaluate` will check.
    pub fn extract_claims(&self, draft: &str) -> Vec<String> {
        scoring::extract_claims(draft)
    }

    /// Cross-validate every claim against `sources`.
    ///
    /// Results keep the order of `claims`. A poisoned cache lock is treated
    /// as a miss.
    ///
    /// # Errors
    ///
    /// `SiftError::TaskAborted` if a scoring task panics or is aborted.
    pub async fn cross_validate(
        &self,
        claims: &[String],
        sources: &[Source],
    ) -> SiftResult<Vec<CrossValidationResult>> {
        let mut urls: Vec<&str> = sources.iter().map(|s| s.url.as_str()).collect();
        urls.sort_unstable();
        let shared_sources: Arc<Vec<Source>> = Arc::new(sources.to_vec());

        let mut pending = Vec::with_capacity(claims.len());
        let mut hits = 0usize;

        for claim in claims {
            let key = cache_key(claim, &urls);
            let cached = self
                .cache
                .lock()
                .ok()
                .and_then(|cache| cache.get(&key).cloned());

            match cached {
                Some(result) => {
                    hits += 1;
                    pending.push(Pending::Cached(result));
                }
                None => {
                    let classifier = Arc::clone(&self.classifier);
                    let sources = Arc::clone(&shared_sources);
                    let claim = claim.clone();
                    let handle = self.executor.submit(async move {
                        scoring::cross_validate_claim(
                            &claim,
                            &sources,
                            classifier.as_ref(),
                            Utc::now(),
                        )
                    });
                    pending.push(Pending::Scoring { key, handle });
                }
            }
        }

        debug!(
            claims = claims.len(),
            sources = sources.len(),
            cache_hits = hits,
            "cross-validating claims"
        );

        let mut results = Vec::with_capacity(pending.len());
        for item in pending {
            match item {
                Pending::Cached(result) => results.push(result),
                Pending::Scoring { key, handle } => {
                    let result = handle.await?;
                    if let Ok(mut cache) = self.cache.lock() {
                        cache.set(key, result.clone());
                    }
                    results.push(result);
                }
            }
        }
        Ok(results)
    }

    /// Full credibility report for a draft.
    ///
    /// # Errors
    ///
    /// Propagates `cross_validate` failures.
    pub async fn evaluate(
        &self,
        draft: &str,
        sources: &[Source],
        facts: &[Fact],
    ) -> SiftResult<CredibilityReport> {
        let claims = self.extract_claims(draft);
        let cross_validation = self.cross_validate(&claims, sources).await?;

        let now = Utc::now();
        let uncertainty = scoring::assess_uncertainty(&claims, sources, now);
        let score = scoring::overall_score(sources, facts, &cross_validation, now);

        info!(
            claims = claims.len(),
            overall = score.overall,
            risk = ?uncertainty.risk_level,
            "credibility evaluated"
        );

        Ok(CredibilityReport {
            cross_validation,
            uncertainty,
            score,
        })
    }

    /// Report computed without cross-validation. Used when verification
    /// cannot finish in time.
    pub fn unverified(&self, sources: &[Source], facts: &[Fact]) -> CredibilityReport {
        let now = Utc::now();
        CredibilityReport {
            cross_validation: Vec::new(),
            uncertainty: scoring::assess_uncertainty(&[], sources, now),
            score: scoring::overall_score(sources, facts, &[], now),
        }
    }

    /// Number of cached per-claim verdicts.
    pub fn cached_verdicts(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Drop all cached verdicts.
    pub fn purge_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}
