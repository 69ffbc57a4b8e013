//! Retrieved evidence: sources and the facts extracted from them.

use serde::{Deserialize, Serialize};

/// A single retrieved document.
///
/// `url` is the unique key within a run. `score` is assigned by the
/// retrieval diversifier and always lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    #[serde(default)]
    pub snippet: Option<String>,
    /// Publication date as reported by the search provider, unparsed.
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub score: f64,
}

impl Source {
    /// Create a source with only a URL; everything else empty.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            title: None,
            url: url.into(),
            snippet: None,
            published_date: None,
            score: 0.0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_published_date(mut self, date: impl Into<String>) -> Self {
        self.published_date = Some(date.into());
        self
    }

    /// Title, snippet and URL joined with spaces. Used by text heuristics.
    pub fn text(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if let Some(t) = &self.title {
            parts.push(t);
        }
        if let Some(s) = &self.snippet {
            parts.push(s);
        }
        parts.push(&self.url);
        parts.join(" ")
    }
}

/// A claim extracted from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub statement: String,
    /// URL of the source the statement came from. Empty for placeholders.
    #[serde(default)]
    pub source_ref: String,
    #[serde(default)]
    pub evidence: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
}

impl Fact {
    /// The stand-in fact used when no evidence could be gathered.
    pub fn placeholder() -> Self {
        Self {
            statement: "No supporting evidence was retrieved; the answer relies on general knowledge."
                .to_string(),
            source_ref: String::new(),
            evidence: None,
            published_date: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source_ref.is_empty() && *self == Self::placeholder()
    }
}
