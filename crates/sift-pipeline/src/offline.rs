//! Deterministic, in-process collaborators.
//!
//! `OfflineGenerator` answers every pipeline prompt from the prompt text
//! alone, and `FixtureSearch` serves a fixed corpus. The demo binary and the
//! end-to-end tests run the full pipeline on them without network access.
//!
//! All fixture content is fictional.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use futures_util::stream::{self, StreamExt};
use serde_json::json;
use tracing::debug;

use sift_contracts::{
    error::{SiftError, SiftResult},
    generation::{Generation, GenerationOptions, SearchOptions, TokenUsage},
    source::{Fact, Source},
};
use sift_core::{
    tokens::estimate_tokens,
    traits::{DeltaStream, SearchProvider, TextGenerator},
};
use sift_credibility::scoring::{content_words, keyword_overlap};

use crate::prompts::PromptRole;

/// Drafts shorter than this are sent back by the offline critic.
const MIN_APPROVED_WORDS: usize = 60;

const REVISION_PARAGRAPH: &str = "Further context: the points above are drawn from the cited \
    sources, which differ in recency and authority. Readers should check the publication \
    dates, prefer primary and institutional reporting, and treat single-source claims with \
    caution until independent coverage confirms them.";

// ── Prompt readers ────────────────────────────────────────────────────────────

fn question_of(user: &str) -> &str {
    user.lines()
        .find_map(|l| l.strip_prefix("Question: "))
        .unwrap_or("")
        .trim()
}

/// Lines of the `- ...` list that follows `header`.
fn bullet_section<'a>(user: &'a str, header: &str) -> Vec<&'a str> {
    user.lines()
        .skip_while(|l| l.trim() != header)
        .skip(1)
        .take_while(|l| l.starts_with("- "))
        .map(|l| l.trim_start_matches("- ").trim())
        .collect()
}

/// Splits `statement (source)` as written by the analyst and writer prompts.
fn split_fact_line(line: &str) -> (&str, &str) {
    match line.rfind(" (") {
        Some(idx) if line.ends_with(')') => (&line[..idx], &line[idx + 2..line.len() - 1]),
        _ => (line, ""),
    }
}

fn first_sentence(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|&(i, c)| {
            matches!(c, '.' | '!' | '?' | '。' | '！' | '？')
                && text[i + c.len_utf8()..]
                    .chars()
                    .next()
                    .map_or(true, char::is_whitespace)
        })
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(text.len());
    text[..end].trim()
}

/// Source blocks from an extractor prompt: `[n] url`, title, snippet.
fn source_blocks(user: &str) -> Vec<(String, String, String)> {
    let lines: Vec<&str> = user.lines().collect();
    let mut blocks = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let Some(rest) = line.strip_prefix('[') else { continue };
        let Some((number, url)) = rest.split_once("] ") else { continue };
        if number.parse::<usize>().is_err() {
            continue;
        }
        let title = lines.get(i + 1).copied().unwrap_or_default().to_string();
        let snippet = lines.get(i + 2).copied().unwrap_or_default().to_string();
        blocks.push((url.trim().to_string(), title, snippet));
    }
    blocks
}

// ── OfflineGenerator ──────────────────────────────────────────────────────────

/// A `TextGenerator` that derives every answer from the prompt it is given.
#[derive(Debug, Default)]
pub struct OfflineGenerator {
    calls: AtomicUsize,
}

impl OfflineGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `generate` and `generate_stream` calls served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn plan(user: &str) -> String {
        let question = question_of(user);
        json!({
            "queries": [
                format!("{question} latest developments"),
                format!("{question} analysis"),
            ]
        })
        .to_string()
    }

    fn extract(user: &str) -> String {
        let facts: Vec<Fact> = source_blocks(user)
            .into_iter()
            .filter_map(|(url, title, snippet)| {
                let basis = if snippet.trim().is_empty() { title } else { snippet };
                let statement = first_sentence(&basis).trim_end_matches('.').to_string();
                (!statement.is_empty() && statement != "(untitled)").then(|| Fact {
                    statement,
                    evidence: Some(basis.clone()),
                    source_ref: url,
                    published_date: None,
                })
            })
            .collect();
        format!(
            "Extracted facts:\n```json\n{}\n```",
            json!({ "facts": facts })
        )
    }

    fn analyze(user: &str) -> String {
        let lines = bullet_section(user, "Facts:");
        let key_points: Vec<&str> = lines
            .iter()
            .map(|l| split_fact_line(l).0)
            .filter(|s| *s != Fact::placeholder().statement)
            .take(4)
            .collect();
        let gaps: Vec<&str> = if key_points.is_empty() {
            vec!["No sources were retrieved for this question."]
        } else {
            Vec::new()
        };
        let key_points = if key_points.is_empty() {
            vec!["Evidence for this question could not be retrieved."]
        } else {
            key_points
        };
        format!(
            "Analysis: {}",
            json!({ "key_points": key_points, "gaps": gaps })
        )
    }

    fn write(user: &str) -> String {
        let question = question_of(user);
        let points = bullet_section(user, "Key points:");
        let mut urls: Vec<&str> = bullet_section(user, "Facts:")
            .into_iter()
            .map(|l| split_fact_line(l).1)
            .filter(|u| !u.is_empty())
            .collect();
        urls.dedup();

        let mut draft = format!("## {question}\n\n");
        for point in &points {
            draft.push_str(&format!("- {point}.\n"));
        }
        if !urls.is_empty() {
            draft.push_str(&format!("\nSources: {}\n", urls.join(", ")));
        }
        draft
    }

    fn critique(user: &str) -> String {
        let draft = user.split_once("Draft:\n").map(|(_, d)| d).unwrap_or("");
        let words = draft.split_whitespace().count();
        if words >= MIN_APPROVED_WORDS {
            json!({ "approved": true, "issues": [] }).to_string()
        } else {
            json!({
                "approved": false,
                "issues": ["The answer is brief; add supporting context from the sources."]
            })
            .to_string()
        }
    }

    fn revise(user: &str) -> String {
        let draft = user.split_once("Draft:\n").map(|(_, d)| d).unwrap_or("");
        format!("{}\n\n{}\n", draft.trim_end(), REVISION_PARAGRAPH)
    }

    fn respond(&self, system_prompt: &str, user_prompt: &str) -> SiftResult<Generation> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let role = PromptRole::detect(system_prompt).ok_or_else(|| SiftError::InvalidRequest {
            reason: "offline generator only answers pipeline prompts".to_string(),
        })?;

        let text = match role {
            PromptRole::Planner => Self::plan(user_prompt),
            PromptRole::Extractor => Self::extract(user_prompt),
            PromptRole::Analyst => Self::analyze(user_prompt),
            PromptRole::Writer => Self::write(user_prompt),
            PromptRole::Critic => Self::critique(user_prompt),
            PromptRole::Reviser => Self::revise(user_prompt),
        };
        debug!(?role, chars = text.len(), "offline generation");

        let usage = TokenUsage {
            input: estimate_tokens(system_prompt) + estimate_tokens(user_prompt),
            output: estimate_tokens(&text),
            calls: 1,
        };
        Ok(Generation { text, usage })
    }
}

/// Split `text` into word-sized chunks that concatenate back to `text`.
pub fn word_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if c.is_whitespace() {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _options: &GenerationOptions,
    ) -> SiftResult<Generation> {
        self.respond(system_prompt, user_prompt)
    }

    async fn generate_stream(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _options: &GenerationOptions,
    ) -> SiftResult<DeltaStream> {
        let generation = self.respond(system_prompt, user_prompt)?;
        let chunks = word_chunks(&generation.text);
        Ok(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }
}

// ── FixtureSearch ─────────────────────────────────────────────────────────────

/// A `SearchProvider` over a fixed corpus.
///
/// A source matches when it contains at least one content word of the query.
pub struct FixtureSearch {
    corpus: Vec<Source>,
    latency: Duration,
    calls: AtomicUsize,
}

impl FixtureSearch {
    pub fn new(corpus: Vec<Source>) -> Self {
        Self {
            corpus,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider that never finds anything, like an unconfigured one.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Simulated network latency per search.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// A small mixed-language corpus on AI hardware and AI in healthcare,
    /// dated relative to now.
    pub fn demo() -> Self {
        let days_ago = |d: i64| (Utc::now() - ChronoDuration::days(d)).format("%Y-%m-%d").to_string();
        let corpus = vec![
            Source::new("https://www.reuters.com/technology/ai-chip-shipments")
                .with_title("AI chip shipments hit record as data centre demand surges")
                .with_snippet("Shipments of AI accelerator hardware rose 40 percent this quarter, according to industry data. Foundries are adding capacity.")
                .with_published_date(days_ago(1)),
            Source::new("https://apnews.com/article/ai-hardware-startups")
                .with_title("AI hardware startups raise new funding")
                .with_snippet("Several AI hardware startups announced funding rounds today as investors bet on custom inference chips.")
                .with_published_date(days_ago(0)),
            Source::new("https://www.reuters.com/technology/hbm-memory-supply")
                .with_title("High-bandwidth memory supply remains tight for AI hardware")
                .with_snippet("Memory makers report that high-bandwidth memory for AI hardware is sold out through next year.")
                .with_published_date(days_ago(2)),
            Source::new("https://news.reuters.com/markets/chip-stocks")
                .with_title("Chip stocks rally on AI hardware news")
                .with_snippet("Semiconductor shares rose after strong AI hardware news from suppliers.")
                .with_published_date(days_ago(1)),
            Source::new("https://arxiv.org/abs/2406.01234")
                .with_title("Energy efficiency of AI accelerator hardware: a survey")
                .with_snippet("This survey compares energy efficiency across AI accelerator hardware generations using published benchmark data.")
                .with_published_date(days_ago(40)),
            Source::new("https://tech.sina.com.cn/ai-chip")
                .with_title("人工智能芯片出货量创新高 AI hardware")
                .with_snippet("国内人工智能芯片厂商今日发布新一代产品，出货量持续增长。")
                .with_published_date(days_ago(1)),
            Source::new("https://www.36kr.com/p/ai-hardware")
                .with_title("AI 硬件创业公司获得新融资")
                .with_snippet("多家 AI hardware 初创公司宣布完成新一轮融资。")
                .with_published_date(days_ago(3)),
            Source::new("https://www.nih.gov/news/ai-healthcare-outcomes")
                .with_title("Study finds AI improves healthcare outcomes")
                .with_snippet("A clinical study reports that AI decision support improves patient outcomes in hospitals.")
                .with_published_date(days_ago(12)),
            Source::new("https://www.nature.com/articles/ai-clinical-trial")
                .with_title("AI triage improves outcomes in healthcare trial")
                .with_snippet("Trial data show improved healthcare outcomes when clinicians use AI triage tools.")
                .with_published_date(days_ago(25)),
            Source::new("https://www.who.int/news/ai-health-guidance")
                .with_title("WHO report: AI improves healthcare delivery with safeguards")
                .with_snippet("Evidence suggests AI improves outcomes for patients when healthcare systems apply safeguards.")
                .with_published_date(days_ago(60)),
        ];
        Self::new(corpus)
    }
}

#[async_trait]
impl SearchProvider for FixtureSearch {
    async fn search(&self, query: &str, options: &SearchOptions) -> Vec<Source> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if content_words(query).is_empty() {
            return Vec::new();
        }

        let hits: Vec<Source> = self
            .corpus
            .iter()
            .filter(|s| keyword_overlap(query, &s.text()) > 0.0)
            .take(options.max_results)
            .cloned()
            .collect();
        debug!(query, hits = hits.len(), "fixture search");
        hits
    }
}
