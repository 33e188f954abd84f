//! Core data types shared across the aggregation pipeline.

use serde::{Deserialize, Serialize};

/// The literal query that bypasses text relevance entirely: every document
/// matching the active filters is returned, ordered by popularity.
pub const SENTINEL_QUERY: &str = "#all";

/// Which side of the pipeline a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// A self-hosted document store.
    Local,
    /// The third-party web search API.
    External,
}

impl Origin {
    /// Lowercase tag used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Local => "local",
            Origin::External => "external",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raw hit from one source, before aggregation.
///
/// Scores are source-native and not comparable across origins; the
/// aggregator rescales them onto one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    /// Document title, when the source provides one.
    pub title: Option<String>,
    /// Location of the document. Required for identity; records with an
    /// empty URL are dropped before deduplication.
    pub url: String,
    /// Snippet or description text.
    pub description: Option<String>,
    /// Source kind this record came from.
    pub origin: Origin,
    /// Source-native relevance score, when the source produces one.
    pub score: Option<f64>,
}

/// An aggregated result carrying its normalized score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Document title, when the source provided one.
    pub title: Option<String>,
    /// Location of the document.
    pub url: String,
    /// Snippet or description text.
    pub description: Option<String>,
    /// Source kind this record came from.
    pub origin: Origin,
    /// Normalized score, comparable within a single aggregation run.
    pub score: f64,
}

/// Immutable per-request query bundle.
///
/// Built once at request entry and read-only from then on; no component
/// retains it across requests.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryContext {
    /// The query exactly as the user submitted it.
    pub raw_query: String,
    /// The linguistically preprocessed query used for text search.
    pub query: String,
    /// Document-type filter, already expanded to its synonym group.
    pub type_filter: Vec<String>,
    /// Language filter (ISO code).
    pub lang_filter: Option<String>,
    /// Requested page, 1-based.
    pub page: usize,
    /// Results per page.
    pub per_page: usize,
}

impl QueryContext {
    /// True for the literal `#all` query, checked against the raw input
    /// (preprocessing never sees the sentinel).
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.raw_query.trim() == SENTINEL_QUERY
    }

    /// True when the preprocessed query has text to match against, i.e.
    /// the stores should run a relevance search and return native scores.
    #[must_use]
    pub fn is_text_search(&self) -> bool {
        !self.is_sentinel() && !self.query.trim().is_empty()
    }

    /// True when the external web API should be consulted: the submitted
    /// query is non-empty and not the sentinel.
    #[must_use]
    pub fn wants_external(&self) -> bool {
        !self.is_sentinel() && !self.raw_query.trim().is_empty()
    }

    /// True when a type or language filter is active.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        !self.type_filter.is_empty() || self.lang_filter.is_some()
    }
}

/// Everything one search run produces: a single page of results plus the
/// metadata the caller needs to render pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// The requested page of ranked results.
    pub results: Vec<RankedResult>,
    /// Length of the full combined list before pagination.
    pub total_results: usize,
    /// Page that was served, 1-based.
    pub page: usize,
    /// Page size that was applied.
    pub per_page: usize,
    /// Wall-clock duration of the run in milliseconds.
    pub took_ms: u64,
    /// User-visible note when the run produced nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Extracted readable content of a fetched web page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// Page title from `<title>`, if present.
    pub title: Option<String>,
    /// Main text with boilerplate removed and whitespace collapsed.
    pub text: String,
    /// Whitespace-separated word count of `text`.
    pub word_count: usize,
    /// Whether `text` was cut at the extraction limit.
    pub truncated: bool,
}
