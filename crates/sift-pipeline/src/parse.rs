//! Structured-output parsing.
//!
//! Model output that should be JSON often is not *only* JSON: it may be
//! wrapped in a fenced code block, preceded by prose, or trail off after the
//! object. `StructuredParser` tries an ordered list of extraction strategies
//! and returns the first candidate that both parses and validates against
//! the target JSON Schema.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use sift_contracts::error::{SiftError, SiftResult};

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*(?:json|JSON)?[ \t]*\r?\n?(.*?)```").expect("valid fence regex")
});

/// One way of locating JSON inside model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// The whole (trimmed) text is JSON.
    WholeText,
    /// The contents of the first ```json fenced block that parses.
    FencedBlock,
    /// The first balanced `{...}` or `[...]` span that parses. Brackets inside
    /// JSON strings are ignored.
    BalancedBraces,
}

impl ExtractionStrategy {
    pub const DEFAULT_CHAIN: [ExtractionStrategy; 3] = [
        ExtractionStrategy::WholeText,
        ExtractionStrategy::FencedBlock,
        ExtractionStrategy::BalancedBraces,
    ];

    /// Every JSON value this strategy can find in `text`, in order.
    pub fn candidates(self, text: &str) -> Vec<Value> {
        match self {
            ExtractionStrategy::WholeText => {
                serde_json::from_str(text.trim()).ok().into_iter().collect()
            }
            ExtractionStrategy::FencedBlock => FENCED_BLOCK
                .captures_iter(text)
                .filter_map(|c| c.get(1))
                .filter_map(|m| serde_json::from_str(m.as_str().trim()).ok())
                .collect(),
            ExtractionStrategy::BalancedBraces => balanced_spans(text)
                .into_iter()
                .filter_map(|span| serde_json::from_str(span).ok())
                .collect(),
        }
    }
}

/// Every balanced top-level `{...}` / `[...]` span in `text`, in order of
/// their opening bracket. Unterminated spans are skipped.
fn balanced_spans(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;

    while let Some(offset) = text[start..].find(['{', '[']) {
        let open = start + offset;
        match span_end(bytes, open) {
            Some(end) => {
                spans.push(&text[open..=end]);
                // Nested candidates are covered by the outer span.
                start = open + 1;
            }
            None => start = open + 1,
        }
    }
    spans
}

/// Index of the bracket closing the one at `open`, honouring JSON strings.
fn span_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.pop() != Some(b) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses model output into a schema-checked value.
pub struct StructuredParser {
    name: &'static str,
    validator: jsonschema::Validator,
    strategies: Vec<ExtractionStrategy>,
}

impl StructuredParser {
    /// Build a parser for `schema` using the default strategy chain.
    ///
    /// # Errors
    ///
    /// `ParseFailure` if `schema` is not a valid JSON Schema document.
    pub fn new(name: &'static str, schema: &Value) -> SiftResult<Self> {
        let validator = jsonschema::validator_for(schema).map_err(|e| SiftError::ParseFailure {
            reason: format!("invalid schema for {name}: {e}"),
        })?;
        Ok(Self {
            name,
            validator,
            strategies: ExtractionStrategy::DEFAULT_CHAIN.to_vec(),
        })
    }

    pub fn with_strategies(mut self, strategies: &[ExtractionStrategy]) -> Self {
        self.strategies = strategies.to_vec();
        self
    }

    /// First candidate, across all strategies in order, that validates.
    pub fn parse_value(&self, text: &str) -> SiftResult<Value> {
        for strategy in &self.strategies {
            for candidate in strategy.candidates(text) {
                if self.validator.is_valid(&candidate) {
                    debug!(target_schema = self.name, ?strategy, "structured output extracted");
                    return Ok(candidate);
                }
            }
        }
        Err(SiftError::ParseFailure {
            reason: format!("no {} object found in {} chars of output", self.name, text.len()),
        })
    }

    pub fn parse<T: DeserializeOwned>(&self, text: &str) -> SiftResult<T> {
        let value = self.parse_value(text)?;
        serde_json::from_value(value).map_err(|e| SiftError::ParseFailure {
            reason: format!("{} does not match its type: {e}", self.name),
        })
    }
}

// ── Target schemas ──────────────────────────────────────────────────────────

pub fn query_expansion_schema() -> Value {
    json!({
        "type": "object",
        "required": ["queries"],
        "properties": {
            "queries": { "type": "array", "items": { "type": "string" } }
        }
    })
}

pub fn facts_schema() -> Value {
    json!({
        "type": "object",
        "required": ["facts"],
        "properties": {
            "facts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["statement"],
                    "properties": {
                        "statement": { "type": "string", "minLength": 1 },
                        "source_ref": { "type": "string" },
                        "evidence": { "type": ["string", "null"] },
                        "published_date": { "type": ["string", "null"] }
                    }
                }
            }
        }
    })
}

pub fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "required": ["key_points"],
        "properties": {
            "key_points": { "type": "array", "minItems": 1, "items": { "type": "string" } },
            "gaps": { "type": "array", "items": { "type": "string" } }
        }
    })
}

pub fn critique_schema() -> Value {
    json!({
        "type": "object",
        "required": ["approved"],
        "properties": {
            "approved": { "type": "boolean" },
            "issues": { "type": "array", "items": { "type": "string" } }
        }
    })
}

/// Last resort for fact extraction: the first `limit` sentences of `text`
/// that are long enough to be claims.
pub fn sentence_heuristic(text: &str, limit: usize) -> Vec<String> {
    sift_credibility::scoring::extract_claims(text)
        .into_iter()
        .take(limit)
        .collect()
}
