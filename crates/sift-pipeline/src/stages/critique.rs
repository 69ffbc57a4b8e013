//! Critique: one review round, plus a rewrite when the critic objects.

use serde::Deserialize;
use tracing::info;

use sift_contracts::{error::SiftResult, generation::GenerationOptions};

use super::StageContext;
use crate::parse::{critique_schema, StructuredParser};
use crate::prompts::{critic_user, reviser_user, PromptRole};

/// Outcome of one critique round.
#[derive(Debug, Clone, PartialEq)]
pub struct CritiqueRound {
    pub approved: bool,
    pub issues: Vec<String>,
    /// The rewritten draft, when the critic asked for changes.
    pub revised: Option<String>,
}

impl CritiqueRound {
    /// The Critique fallback: accept the draft as it stands.
    pub fn approve() -> Self {
        Self {
            approved: true,
            issues: Vec::new(),
            revised: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Verdict {
    approved: bool,
    #[serde(default)]
    issues: Vec<String>,
}

pub async fn run(ctx: &StageContext<'_>, round: u32, draft: &str) -> SiftResult<CritiqueRound> {
    let reply = ctx
        .generate(
            PromptRole::Critic,
            &critic_user(ctx.question, draft),
            GenerationOptions::structured(512),
        )
        .await?;
    let verdict: Verdict = StructuredParser::new("critique", &critique_schema())?.parse(&reply)?;

    info!(
        round,
        approved = verdict.approved,
        issues = verdict.issues.len(),
        "critique round"
    );
    if verdict.approved {
        return Ok(CritiqueRound {
            approved: true,
            issues: verdict.issues,
            revised: None,
        });
    }

    let rewrite = ctx
        .generate(
            PromptRole::Reviser,
            &reviser_user(ctx.question, draft, &verdict.issues),
            GenerationOptions::prose(2_048),
        )
        .await?;
    let rewrite = rewrite.trim();

    Ok(CritiqueRound {
        approved: false,
        issues: verdict.issues,
        revised: (!rewrite.is_empty() && rewrite != draft.trim()).then(|| format!("{rewrite}\n")),
    })
}
