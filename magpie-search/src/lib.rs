//! # magpie-search
//!
//! Result aggregation engine for Magpie.
//!
//! This crate implements the retrieval-and-ranking core of the Magpie
//! meta-search backend: it fans a query out to the configured local
//! document stores and an optional external web search provider, merges
//! the two pools, and returns one ranked, paginated result list. It
//! compiles into the Magpie server as a library dependency.
//!
//! ## Design
//!
//! - Local stores and the external provider are queried concurrently
//! - URLs are normalised (scheme default, host case, IDN, trailing
//!   slash) before deduplication, and local copies win over external
//!   duplicates
//! - Local relevance scores are boosted; external results carry a
//!   rank-decay score so provider order survives the merge
//! - The merged list interleaves external and local results in a fixed
//!   ratio instead of sorting them into one pool
//! - In-memory caches with configurable TTL for external queries and
//!   favicon lookups
//! - Graceful degradation: a failing store or provider is logged and
//!   skipped, never fatal
//!
//! ## Security
//!
//! - External API credentials never appear in logs or error messages
//! - Search queries are logged only at trace level
//! - Fetched page content is stripped of scripts before extraction

pub mod config;
pub mod content;
pub mod error;
pub mod external;
pub mod favicon;
pub mod http;
pub mod pipeline;
pub mod source;
pub mod types;

pub use config::SearchConfig;
pub use content::{extract_content, fetch_html, summarize, PageSummary};
pub use error::{Result, SearchError};
pub use external::WebSearchClient;
pub use favicon::FaviconResolver;
pub use pipeline::{aggregate, normalize_url, paginate, run_search};
pub use source::{ExternalSource, LocalBatch, LocalSource};
pub use types::{
    Origin, PageContent, QueryContext, RankedResult, RawResult, SearchOutcome, SENTINEL_QUERY,
};
