//! Analyze: condense facts into the key points an answer must cover.

use tracing::info;

use sift_contracts::{
    error::SiftResult,
    generation::GenerationOptions,
    plan::Analysis,
    source::Fact,
};

use super::StageContext;
use crate::parse::{analysis_schema, StructuredParser};
use crate::prompts::{analyst_user, PromptRole};

const FALLBACK_KEY_POINTS: usize = 5;

/// Key points straight from fact statements, placeholders excluded.
pub fn fallback(facts: &[Fact]) -> Analysis {
    let key_points: Vec<String> = facts
        .iter()
        .filter(|f| !f.is_placeholder())
        .take(FALLBACK_KEY_POINTS)
        .map(|f| f.statement.clone())
        .collect();
    let gaps = if key_points.is_empty() {
        vec!["No retrieved evidence supports this answer.".to_string()]
    } else {
        Vec::new()
    };
    Analysis { key_points, gaps }
}

pub async fn run(ctx: &StageContext<'_>, facts: &[Fact]) -> SiftResult<Analysis> {
    let reply = ctx
        .generate(
            PromptRole::Analyst,
            &analyst_user(ctx.question, facts),
            GenerationOptions::structured(512),
        )
        .await?;
    let analysis: Analysis = StructuredParser::new("analysis", &analysis_schema())?.parse(&reply)?;

    info!(
        key_points = analysis.key_points.len(),
        gaps = analysis.gaps.len(),
        "analysis ready"
    );
    Ok(analysis)
}
