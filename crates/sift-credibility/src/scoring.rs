//! Pure credibility formulas.
//!
//! Everything here is deterministic given its inputs and a `now` timestamp.
//! Caching and concurrency live in [`crate::engine`].
//!
//! Scale contract: sub-scores and the overall score are integers in
//! `[0, 100]`; `UncertaintyAssessment::confidence` is a fraction in `[0, 1]`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use sift_contracts::{
    credibility::{
        Consensus, CredibilityBreakdown, CredibilityScore, CrossValidationResult,
        EvidenceStrength, Recommendation, RiskLevel, UncertaintyAssessment,
    },
    source::{Fact, Source},
};
use sift_core::traits::TextClassifier;
use sift_retrieval::{age_in_days, authority_score, domain::domain_key, host_of, time_score};

/// Authority assumed for hosts missing from the authority table.
pub const DEFAULT_AUTHORITY: f64 = 0.5;

/// Quality assigned to a source whose URL cannot be parsed.
pub const UNPARSEABLE_QUALITY: f64 = 0.3;

/// Support above this marks a source as supporting a claim.
pub const SUPPORT_THRESHOLD: f64 = 0.45;

/// Support below this marks a source as contradicting a claim.
pub const CONTRADICT_THRESHOLD: f64 = 0.25;

/// Sub-scores below this produce a recommendation and a warning.
pub const ATTENTION_THRESHOLD: u32 = 70;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "this", "that", "with", "from", "they", "will", "would",
    "there", "their", "what", "about", "which", "when", "were", "been", "into", "than", "then",
    "them", "these", "those", "its", "also", "more", "most", "some", "such", "only", "very",
];

const FACTUAL_LEXICON: &[&str] = &[
    "study", "studies", "research", "data", "according", "percent", "report", "reported",
    "evidence", "trial", "survey", "analysis", "published", "statistics", "official",
];

const HEDGE_WORDS: &[&str] = &[
    "may", "might", "could", "possibly", "perhaps", "reportedly", "allegedly", "rumor",
    "rumored", "unconfirmed", "likely", "unclear",
];

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[.!?。！？]+(\s+|$)").expect("valid sentence regex")
});

static MARKDOWN_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(#{1,6}[ \t]+|[-*+][ \t]+|>[ \t]*|\d+[.)][ \t]+)").expect("valid markdown regex")
});

static MARKDOWN_INLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\*\*|__|`+|\*|\[|\]\([^)]*\))").expect("valid inline regex"));

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn to_percent(fraction: f64) -> u32 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u32
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn lower_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Per-source quality ──────────────────────────────────────────────────────

/// Authority of one source: table value, 0.5 when unknown, 0.3 when the URL
/// cannot be parsed.
pub fn source_authority(source: &Source) -> f64 {
    match host_of(&source.url) {
        Some(host) => authority_score(&host).unwrap_or(DEFAULT_AUTHORITY),
        None => UNPARSEABLE_QUALITY,
    }
}

pub fn source_time_score(source: &Source, now: DateTime<Utc>) -> f64 {
    time_score(age_in_days(source.published_date.as_deref(), now))
}

/// `0.7 * authority + 0.3 * time score`, or 0.3 for an unparseable URL.
pub fn single_source_quality(source: &Source, now: DateTime<Utc>) -> f64 {
    match host_of(&source.url) {
        Some(host) => {
            let authority = authority_score(&host).unwrap_or(DEFAULT_AUTHORITY);
            0.7 * authority + 0.3 * source_time_score(source, now)
        }
        None => UNPARSEABLE_QUALITY,
    }
}

/// Mean per-source quality as an integer in `[0, 100]`. Empty input is 0.
pub fn source_quality(sources: &[Source], now: DateTime<Utc>) -> u32 {
    mean(sources.iter().map(|s| single_source_quality(s, now)))
        .map(to_percent)
        .unwrap_or(0)
}

/// `round(0.6 * source_quality + 40 * min(facts / 5, 1))`, clamped.
///
/// Placeholder facts do not count as extracted facts.
pub fn fact_checking_score(facts: &[Fact], sources: &[Source], now: DateTime<Utc>) -> u32 {
    let real_facts = facts.iter().filter(|f| !f.is_placeholder()).count();
    let coverage = (real_facts as f64 / 5.0).min(1.0);
    let raw = 0.6 * source_quality(sources, now) as f64 + 40.0 * coverage;
    raw.round().clamp(0.0, 100.0) as u32
}

/// Mean time score as an integer in `[0, 100]`. Empty input is 0.
pub fn temporal_validity(sources: &[Source], now: DateTime<Utc>) -> u32 {
    mean(sources.iter().map(|s| source_time_score(s, now)))
        .map(to_percent)
        .unwrap_or(0)
}

/// Mean authority as an integer in `[0, 100]`. Empty input is 0.
pub fn authority_weight(sources: &[Source]) -> u32 {
    mean(sources.iter().map(source_authority))
        .map(to_percent)
        .unwrap_or(0)
}

// ── Claim support ───────────────────────────────────────────────────────────

/// Claim tokens longer than two characters that are not stopwords.
///
/// Each word appears once, in order of first occurrence.
pub fn content_words(claim: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    lower_tokens(claim)
        .into_iter()
        .filter(|t| t.chars().count() > 2 && !STOPWORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Share of the claim's content words found in the source text.
pub fn keyword_overlap(claim: &str, source_text: &str) -> f64 {
    let words = content_words(claim);
    if words.is_empty() {
        return 0.0;
    }
    let haystack = source_text.to_lowercase();
    let found = words.iter().filter(|w| haystack.contains(w.as_str())).count();
    found as f64 / words.len() as f64
}

fn lexicon_hit(text: &str) -> bool {
    lower_tokens(text)
        .iter()
        .any(|t| FACTUAL_LEXICON.contains(&t.as_str()))
}

/// `0.4 * overlap + 0.3 * topic + 0.2 * sentiment + 0.1 * lexicon`.
pub fn support_score(claim: &str, source: &Source, classifier: &dyn TextClassifier) -> f64 {
    let text = source.text();

    let overlap = keyword_overlap(claim, &text);
    let topic = if classifier.classify_topic(claim) == classifier.classify_topic(&text) {
        1.0
    } else {
        0.3
    };
    let sentiment = if classifier.classify_sentiment(claim) == classifier.classify_sentiment(&text) {
        1.0
    } else {
        0.5
    };
    let lexicon = if lexicon_hit(&text) { 1.0 } else { 0.5 };

    0.4 * overlap + 0.3 * topic + 0.2 * sentiment + 0.1 * lexicon
}

fn consensus_for(supporting: usize, contradicting: usize) -> Consensus {
    if supporting > 2 * contradicting {
        Consensus::Strong
    } else if contradicting == 0 {
        Consensus::Weak
    } else {
        Consensus::Conflicting
    }
}

fn evidence_strength_for(supporting: usize) -> EvidenceStrength {
    match supporting {
        n if n >= 3 => EvidenceStrength::High,
        n if n >= 1 => EvidenceStrength::Medium,
        _ => EvidenceStrength::Low,
    }
}

/// Check one claim against every source.
pub fn cross_validate_claim(
    claim: &str,
    sources: &[Source],
    classifier: &dyn TextClassifier,
    now: DateTime<Utc>,
) -> CrossValidationResult {
    let mut supporting = Vec::new();
    let mut contradicting = Vec::new();

    for source in sources {
        let support = support_score(claim, source, classifier);
        if support > SUPPORT_THRESHOLD {
            supporting.push(source.clone());
        } else if support < CONTRADICT_THRESHOLD {
            contradicting.push(source.clone());
        }
    }

    let support_ratio = if sources.is_empty() {
        0.0
    } else {
        supporting.len() as f64 / sources.len() as f64
    };
    let quality = |set: &[Source]| {
        mean(set.iter().map(|s| single_source_quality(s, now))).unwrap_or(0.0)
    };
    let confidence = to_percent(clamp01(
        0.6 * support_ratio + 0.4 * quality(&supporting) - 0.3 * quality(&contradicting),
    ));

    CrossValidationResult {
        claim: claim.to_string(),
        consensus: consensus_for(supporting.len(), contradicting.len()),
        evidence_strength: evidence_strength_for(supporting.len()),
        confidence,
        supporting_sources: supporting,
        contradicting_sources: contradicting,
    }
}

/// Mean per-result points: consensus (30/15/5) + strength (20/12/5) +
/// half the confidence. Empty input is 0.
pub fn cross_validation_score(results: &[CrossValidationResult]) -> u32 {
    let points = |r: &CrossValidationResult| {
        let consensus = match r.consensus {
            Consensus::Strong => 30.0,
            Consensus::Weak => 15.0,
            Consensus::Conflicting => 5.0,
        };
        let strength = match r.evidence_strength {
            EvidenceStrength::High => 20.0,
            EvidenceStrength::Medium => 12.0,
            EvidenceStrength::Low => 5.0,
        };
        (consensus + strength + 0.5 * r.confidence as f64).min(100.0)
    };
    mean(results.iter().map(points))
        .map(|m| m.round().clamp(0.0, 100.0) as u32)
        .unwrap_or(0)
}

// ── Uncertainty ─────────────────────────────────────────────────────────────

/// Collect uncertainty factors and derive confidence, risk and a
/// recommendation from how many were found.
pub fn assess_uncertainty(
    claims: &[String],
    sources: &[Source],
    now: DateTime<Utc>,
) -> UncertaintyAssessment {
    let mut factors = Vec::new();
    let mut alternatives = Vec::new();
    let mut flag = |factor: &str, alternative: &str| {
        factors.push(factor.to_string());
        alternatives.push(alternative.to_string());
    };

    if sources.len() < 3 {
        flag(
            "fewer than three sources",
            "broaden the search to gather independent sources",
        );
    }
    if source_quality(sources, now) < 60 {
        flag(
            "average source quality below 60",
            "prefer primary, institutional or peer-reviewed sources",
        );
    }
    if claims.is_empty() {
        flag(
            "no verifiable claims",
            "restate the answer as concrete, checkable claims",
        );
    }

    let undated = sources
        .iter()
        .filter(|s| age_in_days(s.published_date.as_deref(), now).is_none())
        .count();
    if !sources.is_empty() && undated * 2 > sources.len() {
        flag(
            "most sources are undated",
            "look for dated reporting to confirm the information is current",
        );
    }

    if sources.len() >= 2 {
        let mut per_domain: HashMap<String, usize> = HashMap::new();
        for s in sources {
            *per_domain.entry(domain_key(&s.url)).or_default() += 1;
        }
        let largest = per_domain.values().copied().max().unwrap_or(0);
        if largest * 2 > sources.len() {
            flag(
                "evidence concentrated in one domain",
                "corroborate with sources from other publishers",
            );
        }
    }

    let hedged = claims.iter().any(|c| {
        lower_tokens(c)
            .iter()
            .any(|t| HEDGE_WORDS.contains(&t.as_str()))
    });
    if hedged {
        flag(
            "claims use hedged language",
            "separate confirmed findings from speculation",
        );
    }

    // Whole percent avoids float drift at the 0.4 and 0.7 boundaries.
    let percent = 100i64.saturating_sub(20 * factors.len() as i64).max(10);
    let confidence = percent as f64 / 100.0;

    let risk_level = if confidence >= 0.7 {
        RiskLevel::Low
    } else if confidence >= 0.4 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    };
    let recommendation = if confidence >= 0.6 {
        Recommendation::Proceed
    } else if confidence >= 0.3 {
        Recommendation::Caution
    } else {
        Recommendation::Reject
    };

    UncertaintyAssessment {
        confidence,
        factors,
        alternatives,
        recommendation,
        risk_level,
    }
}

// ── Overall score ───────────────────────────────────────────────────────────

/// Weighted overall credibility with per-dimension advice.
pub fn overall_score(
    sources: &[Source],
    facts: &[Fact],
    results: &[CrossValidationResult],
    now: DateTime<Utc>,
) -> CredibilityScore {
    let breakdown = CredibilityBreakdown {
        source_quality: source_quality(sources, now),
        fact_checking: fact_checking_score(facts, sources, now),
        cross_validation: cross_validation_score(results),
        temporal_validity: temporal_validity(sources, now),
        authority_weight: authority_weight(sources),
    };

    let overall = (0.25 * breakdown.source_quality as f64
        + 0.25 * breakdown.fact_checking as f64
        + 0.25 * breakdown.cross_validation as f64
        + 0.15 * breakdown.temporal_validity as f64
        + 0.10 * breakdown.authority_weight as f64)
        .round()
        .clamp(0.0, 100.0) as u32;

    let advice: [(u32, &str, &str); 5] = [
        (
            breakdown.source_quality,
            "Add sources from more authoritative publishers",
            "Source quality is low",
        ),
        (
            breakdown.fact_checking,
            "Extract more facts and tie each to a source",
            "Few claims are backed by extracted facts",
        ),
        (
            breakdown.cross_validation,
            "Corroborate key claims with independent sources",
            "Key claims lack cross-source agreement",
        ),
        (
            breakdown.temporal_validity,
            "Prefer recent, dated sources",
            "Evidence may be outdated or undated",
        ),
        (
            breakdown.authority_weight,
            "Include institutional or peer-reviewed sources",
            "Few sources come from recognised authorities",
        ),
    ];

    let mut recommendations = Vec::new();
    let mut warnings = Vec::new();
    for (score, recommendation, warning) in advice {
        if score < ATTENTION_THRESHOLD {
            recommendations.push(recommendation.to_string());
            warnings.push(warning.to_string());
        }
    }

    CredibilityScore {
        overall,
        breakdown,
        recommendations,
        warnings,
    }
}

// ── Claim extraction ────────────────────────────────────────────────────────

/// Most claims taken from one draft.
pub const MAX_CLAIMS: usize = 8;

fn long_enough(sentence: &str) -> bool {
    let cjk_chars = sentence.chars().filter(|c| sift_retrieval::domain::is_cjk(*c)).count();
    sentence.split_whitespace().count() >= 4 || cjk_chars >= 8
}

/// Split a draft into checkable claims: sentences of at least four words
/// with markdown markers removed, at most [`MAX_CLAIMS`].
pub fn extract_claims(draft: &str) -> Vec<String> {
    let stripped = MARKDOWN_PREFIX.replace_all(draft, "");
    let stripped = MARKDOWN_INLINE.replace_all(&stripped, "");

    let mut claims = Vec::new();
    for line in stripped.lines() {
        let mut start = 0;
        let mut push = |piece: &str| {
            let sentence = piece.trim();
            if long_enough(sentence) {
                claims.push(sentence.to_string());
            }
        };
        for m in SENTENCE_END.find_iter(line) {
            push(&line[start..m.start()]);
            start = m.end();
        }
        push(&line[start..]);
    }
    claims.truncate(MAX_CLAIMS);
    claims
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use super::*;
    use crate::classifier::KeywordClassifier;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn dated(url: &str, days_ago: i64) -> Source {
        Source::new(url).with_published_date((now() - Duration::days(days_ago)).to_rfc3339())
    }

    fn healthcare_sources() -> Vec<Source> {
        vec![
            dated("https://nih.gov/ai-care", 2)
                .with_title("Study: AI improves healthcare outcomes")
                .with_snippet("A clinical study reports AI tools improve patient outcomes across hospitals."),
            dated("https://nature.com/articles/ai-health", 10)
                .with_title("AI improves outcomes in healthcare trial")
                .with_snippet("Trial data show improved healthcare outcomes with AI triage."),
            dated("https://who.int/news/ai", 20)
                .with_title("WHO report: AI improves healthcare delivery")
                .with_snippet("Evidence suggests AI improves outcomes for patients in healthcare systems."),
        ]
    }

    // ── source_quality ────────────────────────────────────────────────────────

    #[test]
    fn test_source_quality_empty_is_zero() {
        assert_eq!(source_quality(&[], now()), 0);
    }

    /// An authority-table host with a fresh date scores near its authority.
    #[test]
    fn test_source_quality_known_and_unknown_hosts() {
        // 0.7 * 0.9 + 0.3 * 1.0 = 0.93
        assert_eq!(source_quality(&[dated("https://reuters.com/x", 1)], now()), 93);
        // 0.7 * 0.5 + 0.3 * 0.6 = 0.53
        assert_eq!(source_quality(&[Source::new("https://unknown.xyz/")], now()), 53);
        assert_eq!(source_quality(&[Source::new("not a url")], now()), 30);
    }

    #[test]
    fn test_fact_checking_score() {
        let facts: Vec<Fact> = (0..5)
            .map(|i| Fact {
                statement: format!("fact {i}"),
                source_ref: String::new(),
                evidence: None,
                published_date: None,
            })
            .collect();
        let sources = vec![Source::new("not a url")];

        // 0.6 * 30 + 40 = 58
        assert_eq!(fact_checking_score(&facts, &sources, now()), 58);
        // Placeholders add no coverage: 0.6 * 30 = 18
        assert_eq!(fact_checking_score(&[Fact::placeholder()], &sources, now()), 18);
    }

    #[test]
    fn test_temporal_and_authority() {
        let sources = vec![dated("https://reuters.com/a", 3), Source::new("https://reddit.com/r")];
        assert_eq!(temporal_validity(&sources, now()), 80);
        assert_eq!(authority_weight(&sources), 65);
        assert_eq!(temporal_validity(&[], now()), 0);
        assert_eq!(authority_weight(&[]), 0);
    }

    // ── cross-validation ──────────────────────────────────────────────────────

    #[test]
    fn test_content_words_drop_stopwords_and_short_tokens() {
        assert_eq!(
            content_words("AI is the future of healthcare"),
            vec!["future".to_string(), "healthcare".to_string()]
        );
    }

    #[test]
    fn test_keyword_overlap_ratio() {
        let overlap = keyword_overlap("AI improves healthcare outcomes", "Healthcare outcomes are mixed");
        assert!((overlap - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(keyword_overlap("a an of", "anything"), 0.0);
    }

    #[test]
    fn test_repeated_words_count_once() {
        assert_eq!(
            content_words("chip exports lifted chip stocks"),
            vec!["chip", "exports", "lifted", "stocks"]
        );
        let overlap = keyword_overlap("chip exports lifted chip stocks", "Chip news");
        assert!((overlap - 0.25).abs() < 1e-9);
    }

    /// Three topical, positive, well-sourced reports give strong consensus.
    #[test]
    fn test_healthcare_fixture_is_strong_and_high() {
        let classifier = KeywordClassifier::new();
        let result = cross_validate_claim(
            "AI improves healthcare outcomes",
            &healthcare_sources(),
            &classifier,
            now(),
        );

        assert_eq!(result.supporting_sources.len(), 3);
        assert!(result.contradicting_sources.is_empty());
        assert_eq!(result.consensus, Consensus::Strong);
        assert_eq!(result.evidence_strength, EvidenceStrength::High);
        assert!(result.confidence >= 90, "confidence {}", result.confidence);
    }

    #[test]
    fn test_unrelated_sources_contradict() {
        let classifier = KeywordClassifier::new();
        let sources = vec![
            Source::new("https://example.com/a").with_title("Stock market falls on weak earnings"),
            Source::new("https://example.net/b").with_title("Parliament election loss for ruling party"),
        ];
        let result = cross_validate_claim("AI improves healthcare outcomes", &sources, &classifier, now());

        assert!(result.supporting_sources.is_empty());
        assert_eq!(result.contradicting_sources.len(), 2);
        assert_eq!(result.consensus, Consensus::Conflicting);
        assert_eq!(result.evidence_strength, EvidenceStrength::Low);
        assert_eq!(result.confidence, 0);
    }

    #[test]
    fn test_no_sources_is_weak_and_low() {
        let classifier = KeywordClassifier::new();
        let result = cross_validate_claim("Anything at all here", &[], &classifier, now());
        assert_eq!(result.consensus, Consensus::Weak);
        assert_eq!(result.evidence_strength, EvidenceStrength::Low);
        assert_eq!(result.confidence, 0);
    }

    #[test]
    fn test_cross_validation_score_points() {
        let classifier = KeywordClassifier::new();
        let strong = cross_validate_claim(
            "AI improves healthcare outcomes",
            &healthcare_sources(),
            &classifier,
            now(),
        );
        let expected = (30.0 + 20.0 + 0.5 * strong.confidence as f64).min(100.0).round() as u32;
        assert_eq!(cross_validation_score(std::slice::from_ref(&strong)), expected);
        assert_eq!(cross_validation_score(&[]), 0);
    }

    // ── uncertainty ───────────────────────────────────────────────────────────

    #[test]
    fn test_uncertainty_with_good_evidence_proceeds() {
        let claims = vec!["AI improves healthcare outcomes".to_string()];
        let assessment = assess_uncertainty(&claims, &healthcare_sources(), now());

        assert!(assessment.factors.is_empty(), "factors: {:?}", assessment.factors);
        assert_eq!(assessment.confidence, 1.0);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(assessment.recommendation, Recommendation::Proceed);
    }

    #[test]
    fn test_uncertainty_with_no_evidence_cautions() {
        let assessment = assess_uncertainty(&[], &[], now());

        // fewer than three sources, quality below 60, no claims
        assert_eq!(assessment.factors.len(), 3);
        assert_eq!(assessment.alternatives.len(), 3);
        assert_eq!(assessment.confidence, 0.4);
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
        assert_eq!(assessment.recommendation, Recommendation::Caution);
    }

    #[test]
    fn test_uncertainty_floor_and_hedging() {
        let claims = vec!["The chip may reportedly ship soon".to_string()];
        let sources = vec![
            Source::new("https://blog.example.com/1"),
            Source::new("https://www.example.com/2"),
        ];
        let assessment = assess_uncertainty(&claims, &sources, now());

        // few sources, low quality, undated, one domain, hedged
        assert_eq!(assessment.factors.len(), 5);
        assert_eq!(assessment.confidence, 0.1);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.recommendation, Recommendation::Reject);
    }

    // ── overall score ─────────────────────────────────────────────────────────

    #[test]
    fn test_overall_score_empty_inputs() {
        let score = overall_score(&[], &[], &[], now());
        assert_eq!(score.overall, 0);
        assert_eq!(score.recommendations.len(), 5);
        assert_eq!(score.warnings.len(), 5);
    }

    #[test]
    fn test_overall_score_weights() {
        let classifier = KeywordClassifier::new();
        let sources = healthcare_sources();
        let facts: Vec<Fact> = (0..5)
            .map(|i| Fact {
                statement: format!("fact {i}"),
                source_ref: sources[0].url.clone(),
                evidence: None,
                published_date: None,
            })
            .collect();
        let results = vec![cross_validate_claim(
            "AI improves healthcare outcomes",
            &sources,
            &classifier,
            now(),
        )];

        let score = overall_score(&sources, &facts, &results, now());
        let b = score.breakdown;
        let expected = (0.25 * b.source_quality as f64
            + 0.25 * b.fact_checking as f64
            + 0.25 * b.cross_validation as f64
            + 0.15 * b.temporal_validity as f64
            + 0.10 * b.authority_weight as f64)
            .round() as u32;
        assert_eq!(score.overall, expected);
        assert!(score.overall >= 80, "overall {}", score.overall);
        assert!(score.warnings.is_empty(), "warnings: {:?}", score.warnings);
    }

    // ── claim extraction ──────────────────────────────────────────────────────

    #[test]
    fn test_extract_claims_strips_markdown_and_short_sentences() {
        let draft = "# Summary\n\n- **AI chips** shipped in record volume this quarter. Good.\n\
                     > Analysts expect `demand` to keep growing next year!";
        let claims = extract_claims(draft);
        assert_eq!(
            claims,
            vec![
                "AI chips shipped in record volume this quarter".to_string(),
                "Analysts expect demand to keep growing next year".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_claims_caps_count() {
        let draft = "This is claim number one. ".repeat(20);
        assert_eq!(extract_claims(&draft).len(), MAX_CLAIMS);
    }

    proptest! {
        #[test]
        fn source_quality_stays_in_range(
            hosts in prop::collection::vec("[a-z]{1,8}\\.(com|org|gov|xyz)", 1..10),
            ages in prop::collection::vec(0i64..2000, 1..10),
        ) {
            let sources: Vec<Source> = hosts
                .iter()
                .zip(ages.iter().cycle())
                .map(|(h, a)| dated(&format!("https://{h}/"), *a))
                .collect();
            let q = source_quality(&sources, now());
            prop_assert!(q <= 100);
            prop_assert!(q >= 30);
        }
    }
}
