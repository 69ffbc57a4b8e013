//! Plan: route the question and optionally expand its search queries.

use serde::Deserialize;
use tracing::{debug, info};

use sift_config::ModePreset;
use sift_contracts::{
    error::SiftResult,
    generation::GenerationOptions,
    plan::{RouterPlan, Topic},
    run::RunConfig,
    stage::StageKind,
};

use super::StageContext;
use crate::parse::{query_expansion_schema, StructuredParser};
use crate::prompts::{planner_user, PromptRole};

/// Most extra queries accepted from expansion.
pub const MAX_EXPANDED_QUERIES: usize = 3;

const NEWS_WORDS: &[&str] = &[
    "today", "latest", "news", "breaking", "yesterday", "recent", "this week",
    "just announced", "今天", "最新", "新闻", "近期",
];

const RESEARCH_WORDS: &[&str] = &[
    "study", "studies", "research", "paper", "evidence", "clinical", "trial",
    "meta-analysis", "peer-reviewed", "survey", "研究", "论文",
];

const TECHNICAL_WORDS: &[&str] = &[
    "how to", "code", "api", "error", "install", "configure", "compile", "library",
    "function", "debug", "rust", "python", "代码", "编程",
];

/// True when `lower` mentions any of `words`. Single ASCII words must match
/// a whole token; phrases and CJK words match as substrings.
fn mentions(lower: &str, words: &[&str]) -> bool {
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|t| !t.is_empty())
        .collect();
    words.iter().any(|word| {
        if word.is_ascii() && !word.contains(' ') {
            tokens.contains(word)
        } else {
            lower.contains(word)
        }
    })
}

pub fn classify_topic(question: &str) -> Topic {
    let lower = question.to_lowercase();
    if mentions(&lower, NEWS_WORDS) {
        Topic::News
    } else if mentions(&lower, RESEARCH_WORDS) {
        Topic::Research
    } else if mentions(&lower, TECHNICAL_WORDS) {
        Topic::Technical
    } else {
        Topic::General
    }
}

/// The stages this run will execute, in order.
pub fn step_sequence(config: &RunConfig, preset: &ModePreset) -> Vec<StageKind> {
    StageKind::ALL
        .into_iter()
        .filter(|stage| match stage {
            StageKind::Retrieve => config.use_web,
            other => preset.budget(*other).is_some(),
        })
        .collect()
}

/// Plan built without any generation call. Also the Plan fallback.
pub fn heuristic_plan(question: &str, config: &RunConfig, preset: &ModePreset) -> RouterPlan {
    RouterPlan {
        use_web: config.use_web,
        topic: classify_topic(question),
        step_sequence: step_sequence(config, preset),
        max_iterations: preset.max_iterations,
        queries: vec![question.trim().to_string()],
    }
}

#[derive(Debug, Deserialize)]
struct QueryExpansion {
    queries: Vec<String>,
}

/// Append up to [`MAX_EXPANDED_QUERIES`] new, non-duplicate queries.
fn merge_queries(plan: &mut RouterPlan, proposed: Vec<String>) {
    let mut added = 0;
    for query in proposed {
        let query = query.trim();
        if query.is_empty()
            || plan
                .queries
                .iter()
                .any(|q| q.eq_ignore_ascii_case(query))
        {
            continue;
        }
        plan.queries.push(query.to_string());
        added += 1;
        if added == MAX_EXPANDED_QUERIES {
            break;
        }
    }
}

pub async fn run(ctx: &StageContext<'_>) -> SiftResult<RouterPlan> {
    let mut plan = heuristic_plan(ctx.question, ctx.config, ctx.preset);

    if ctx.config.query_expansion && plan.use_web {
        let reply = ctx
            .generate(
                PromptRole::Planner,
                &planner_user(ctx.question),
                GenerationOptions::structured(256),
            )
            .await?;
        let parser = StructuredParser::new("query_expansion", &query_expansion_schema())?;
        match parser.parse::<QueryExpansion>(&reply) {
            Ok(expansion) => merge_queries(&mut plan, expansion.queries),
            Err(err) => debug!(error = %err, "query expansion unusable, keeping heuristic plan"),
        }
    }

    info!(
        topic = plan.topic.as_str(),
        queries = plan.queries.len(),
        max_iterations = plan.max_iterations,
        "plan ready"
    );
    Ok(plan)
}
