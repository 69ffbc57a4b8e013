//! Extract: turn source snippets into citable facts.

use serde::Deserialize;
use tracing::{debug, info};

use sift_contracts::{
    error::SiftResult,
    generation::GenerationOptions,
    source::{Fact, Source},
};

use super::StageContext;
use crate::parse::{facts_schema, sentence_heuristic, StructuredParser};
use crate::prompts::{extractor_user, PromptRole};

/// Facts taken per source by the sentence heuristic.
const HEURISTIC_FACTS_PER_SOURCE: usize = 2;

#[derive(Debug, Deserialize)]
struct FactList {
    facts: Vec<Fact>,
}

/// The Extract fallback: one placeholder fact, so later stages always have
/// something to cite.
pub fn fallback() -> Vec<Fact> {
    vec![Fact::placeholder()]
}

/// Last-resort extraction straight from the snippets.
pub fn heuristic_facts(sources: &[Source]) -> Vec<Fact> {
    sources
        .iter()
        .flat_map(|source| {
            let text = source
                .snippet
                .as_deref()
                .or(source.title.as_deref())
                .unwrap_or_default();
            sentence_heuristic(text, HEURISTIC_FACTS_PER_SOURCE)
                .into_iter()
                .map(move |statement| Fact {
                    statement,
                    source_ref: source.url.clone(),
                    evidence: source.snippet.clone(),
                    published_date: source.published_date.clone(),
                })
        })
        .collect()
}

/// Fill in dates the model left out from the cited source.
fn attach_dates(facts: &mut [Fact], sources: &[Source]) {
    for fact in facts.iter_mut().filter(|f| f.published_date.is_none()) {
        fact.published_date = sources
            .iter()
            .find(|s| s.url == fact.source_ref)
            .and_then(|s| s.published_date.clone());
    }
}

pub async fn run(ctx: &StageContext<'_>, sources: &[Source]) -> SiftResult<Vec<Fact>> {
    if sources.is_empty() {
        debug!("no sources, extract uses placeholder");
        return Ok(fallback());
    }

    let reply = ctx
        .generate(
            PromptRole::Extractor,
            &extractor_user(ctx.question, sources),
            GenerationOptions::structured(1_024),
        )
        .await?;
    let parser = StructuredParser::new("facts", &facts_schema())?;

    let mut facts = match parser.parse::<FactList>(&reply) {
        Ok(list) if !list.facts.is_empty() => list.facts,
        Ok(_) | Err(_) => {
            debug!("structured facts unusable, using sentence heuristic");
            heuristic_facts(sources)
        }
    };
    if facts.is_empty() {
        facts = fallback();
    }
    attach_dates(&mut facts, sources);

    info!(facts = facts.len(), sources = sources.len(), "facts extracted");
    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_cites_each_source() {
        let sources = vec![
            Source::new("https://a.com/1")
                .with_snippet("Foundry output rose sharply in May. Prices held steady across regions.")
                .with_published_date("2026-05-01"),
            Source::new("https://b.com/2").with_title("Short"),
        ];
        let facts = heuristic_facts(&sources);
        assert_eq!(facts.len(), 2);
        assert!(facts.iter().all(|f| f.source_ref == "https://a.com/1"));
        assert_eq!(facts[0].published_date.as_deref(), Some("2026-05-01"));
    }

    #[test]
    fn test_attach_dates_from_cited_source() {
        let sources = vec![Source::new("https://a.com/1").with_published_date("2026-01-02")];
        let mut facts = vec![Fact {
            statement: "x".to_string(),
            source_ref: "https://a.com/1".to_string(),
            evidence: None,
            published_date: None,
        }];
        attach_dates(&mut facts, &sources);
        assert_eq!(facts[0].published_date.as_deref(), Some("2026-01-02"));
    }

    #[test]
    fn test_fallback_is_single_placeholder() {
        let facts = fallback();
        assert_eq!(facts.len(), 1);
        assert!(facts[0].is_placeholder());
    }
}
