//! Source seams the pipeline fans out over.
//!
//! Stores and the external web API sit behind these traits so the executor
//! can query any number of them concurrently and so tests can substitute
//! counting or failing sources. Both are object-safe: the application holds
//! registered stores as `Vec<Arc<dyn LocalSource>>`.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{QueryContext, RawResult};

/// One store's answer to a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalBatch {
    /// Records matched under the context's filters, in the store's own
    /// order (relevance, popularity, or sample order depending on the
    /// query kind).
    pub records: Vec<RawResult>,
    /// How many rows the store matched for this query.
    pub matched: usize,
}

impl LocalBatch {
    /// Batch wrapping `records`, with `matched` set to their count.
    #[must_use]
    pub fn new(records: Vec<RawResult>) -> Self {
        let matched = records.len();
        Self { records, matched }
    }
}

/// A self-hosted document store.
///
/// Matching policy is the store's business: sentinel queries return
/// everything under the filters in popularity order, text queries run a
/// relevance search with native scores, empty queries return a bounded
/// random sample. Failures are returned as errors; the executor converts
/// them into an empty contribution.
#[async_trait]
pub trait LocalSource: Send + Sync {
    /// Store name, used in logs.
    fn name(&self) -> &str;

    /// Execute the query under the context's filters.
    async fn query(&self, ctx: &QueryContext) -> Result<LocalBatch>;
}

/// The third-party web search API.
///
/// Receives the query text exactly as the user submitted it; the returned
/// list is ordered by the provider's relevance, and position in that list
/// is the only score signal the aggregator uses.
#[async_trait]
pub trait ExternalSource: Send + Sync {
    /// Ordered results for the raw query text.
    async fn search(&self, raw_query: &str) -> Result<Vec<RawResult>>;
}
