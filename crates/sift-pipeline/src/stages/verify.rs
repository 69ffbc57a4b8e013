//! Verify: score the draft against the retrieved evidence.

use sift_contracts::{
    credibility::CredibilityReport,
    error::SiftResult,
    source::{Fact, Source},
};

use super::StageContext;

pub async fn run(
    ctx: &StageContext<'_>,
    draft: &str,
    sources: &[Source],
    facts: &[Fact],
) -> SiftResult<CredibilityReport> {
    ctx.evaluator.evaluate(draft, sources, facts).await
}

/// Report without cross-validation, for when verification cannot finish.
pub fn fallback(ctx: &StageContext<'_>, sources: &[Source], facts: &[Fact]) -> CredibilityReport {
    ctx.evaluator.unverified(sources, facts)
}
