//! Prompt text for every generation call the pipeline makes.
//!
//! Each system prompt opens with a fixed role line so collaborators (and
//! the offline generator) can tell which stage is asking.

use std::fmt::Write as _;

use sift_contracts::{
    plan::Analysis,
    source::{Fact, Source},
};

/// The stage-specific persona behind a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptRole {
    Planner,
    Extractor,
    Analyst,
    Writer,
    Critic,
    Reviser,
}

impl PromptRole {
    pub const ALL: [PromptRole; 6] = [
        PromptRole::Planner,
        PromptRole::Extractor,
        PromptRole::Analyst,
        PromptRole::Writer,
        PromptRole::Critic,
        PromptRole::Reviser,
    ];

    fn role_line(self) -> &'static str {
        match self {
            PromptRole::Planner => "You are the research planner.",
            PromptRole::Extractor => "You are the fact extractor.",
            PromptRole::Analyst => "You are the research analyst.",
            PromptRole::Writer => "You are the report writer.",
            PromptRole::Critic => "You are the report critic.",
            PromptRole::Reviser => "You are the report reviser.",
        }
    }

    /// Which role a system prompt was built for.
    pub fn detect(system_prompt: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| system_prompt.starts_with(role.role_line()))
    }

    /// Full system prompt. `language` is only used by roles that write prose.
    pub fn system_prompt(self, language: &str) -> String {
        let body = match self {
            PromptRole::Planner => "Propose up to three additional web search queries that \
                would help answer the question. Reply with JSON only: \
                {\"queries\": [\"...\"]}."
                .to_string(),
            PromptRole::Extractor => "Extract short, checkable facts from the numbered sources. \
                Every fact must cite the URL it came from. Reply with JSON only: \
                {\"facts\": [{\"statement\": \"...\", \"source_ref\": \"<url>\", \
                \"evidence\": \"<quote>\"}]}."
                .to_string(),
            PromptRole::Analyst => "Group the facts into the key points an answer must cover \
                and list what is still unknown. Reply with JSON only: \
                {\"key_points\": [\"...\"], \"gaps\": [\"...\"]}."
                .to_string(),
            PromptRole::Writer => format!(
                "Write a concise, well-structured answer in Markdown. Use only the key points \
                 and facts given, cite sources by URL, and write in language '{language}'."
            ),
            PromptRole::Critic => "Review the draft for unsupported claims, missing key \
                points and unclear wording. Reply with JSON only: \
                {\"approved\": true|false, \"issues\": [\"...\"]}."
                .to_string(),
            PromptRole::Reviser => format!(
                "Rewrite the draft so that every listed issue is resolved. Keep what is \
                 correct, write in language '{language}', and return only the new draft."
            ),
        };
        format!("{}\n\n{}", self.role_line(), body)
    }
}

pub fn planner_user(question: &str) -> String {
    format!("Question: {question}")
}

/// Sources are numbered blocks: `[n] url`, then title, then snippet.
pub fn extractor_user(question: &str, sources: &[Source]) -> String {
    let mut out = format!("Question: {question}\n\nSources:\n");
    for (i, source) in sources.iter().enumerate() {
        let _ = writeln!(out, "[{}] {}", i + 1, source.url);
        let _ = writeln!(out, "{}", source.title.as_deref().unwrap_or("(untitled)"));
        let _ = writeln!(out, "{}", source.snippet.as_deref().unwrap_or(""));
        if let Some(date) = &source.published_date {
            let _ = writeln!(out, "published: {date}");
        }
        out.push('\n');
    }
    out
}

/// Facts as `- statement (source)` lines.
pub fn analyst_user(question: &str, facts: &[Fact]) -> String {
    let mut out = format!("Question: {question}\n\nFacts:\n");
    for fact in facts {
        let _ = writeln!(out, "- {} ({})", fact.statement, fact.source_ref);
    }
    out
}

pub fn writer_user(question: &str, analysis: &Analysis, facts: &[Fact]) -> String {
    let mut out = format!("Question: {question}\n\nKey points:\n");
    for point in &analysis.key_points {
        let _ = writeln!(out, "- {point}");
    }
    if !analysis.gaps.is_empty() {
        out.push_str("\nOpen gaps:\n");
        for gap in &analysis.gaps {
            let _ = writeln!(out, "- {gap}");
        }
    }
    out.push_str("\nFacts:\n");
    for fact in facts {
        let _ = writeln!(out, "- {} ({})", fact.statement, fact.source_ref);
    }
    out
}

pub fn critic_user(question: &str, draft: &str) -> String {
    format!("Question: {question}\n\nDraft:\n{draft}")
}

pub fn reviser_user(question: &str, draft: &str, issues: &[String]) -> String {
    let mut out = format!("Question: {question}\n\nIssues:\n");
    for issue in issues {
        let _ = writeln!(out, "- {issue}");
    }
    let _ = write!(out, "\nDraft:\n{draft}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_round_trip_through_detect() {
        for role in PromptRole::ALL {
            assert_eq!(PromptRole::detect(&role.system_prompt("en")), Some(role));
        }
        assert_eq!(PromptRole::detect("You are a helpful assistant."), None);
    }

    #[test]
    fn test_writer_prompt_names_language() {
        assert!(PromptRole::Writer.system_prompt("zh").contains("'zh'"));
    }

    #[test]
    fn test_extractor_user_numbers_sources() {
        let sources = vec![
            Source::new("https://a.com/1").with_title("A").with_snippet("alpha"),
            Source::new("https://b.com/2"),
        ];
        let prompt = extractor_user("q?", &sources);
        assert!(prompt.contains("[1] https://a.com/1\nA\nalpha\n"));
        assert!(prompt.contains("[2] https://b.com/2\n(untitled)\n"));
    }
}
