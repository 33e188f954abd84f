//! Query execution: concurrent source fan-out feeding the aggregator.
//!
//! Queries every registered store and (when the query warrants it) the
//! external web API concurrently, converts per-source failures into empty
//! contributions, then hands the collected lists to [`aggregate`] and
//! slices the requested page.

use std::sync::Arc;
use std::time::Instant;

use crate::pipeline::aggregate::aggregate;
use crate::pipeline::paginate::paginate;
use crate::source::{ExternalSource, LocalSource};
use crate::types::{QueryContext, RawResult, SearchOutcome};

/// Message surfaced when no stores are registered and the external API is
/// not in play for this query.
pub const NO_SOURCES_MESSAGE: &str = "no store connections available";
/// Message surfaced when sources ran but nothing matched.
pub const NO_RESULTS_MESSAGE: &str = "no results found";

/// Execute one search request end to end.
///
/// # Pipeline
///
/// 1. Fan out to all stores concurrently with [`futures::future::join_all`],
///    and to the external source alongside them when the query is non-empty
///    and not the sentinel
/// 2. Log per-source failures at warn level; a failed source contributes
///    an empty list and the run continues
/// 3. Aggregate (dedup, boost, decay, 3:2 interleave)
/// 4. Paginate; `total_results` is the pre-pagination length
///
/// Never fails: total exhaustion is reported through
/// [`SearchOutcome::message`], not an error.
pub async fn run_search(
    ctx: &QueryContext,
    stores: &[Arc<dyn LocalSource>],
    external: Option<&dyn ExternalSource>,
) -> SearchOutcome {
    let started = Instant::now();

    let external = if ctx.wants_external() { external } else { None };

    if stores.is_empty() && external.is_none() {
        return SearchOutcome {
            results: Vec::new(),
            total_results: 0,
            page: ctx.page,
            per_page: ctx.per_page,
            took_ms: started.elapsed().as_millis() as u64,
            message: Some(NO_SOURCES_MESSAGE.to_string()),
        };
    }

    // 1. All sources in flight at once.
    let store_futures: Vec<_> = stores
        .iter()
        .map(|store| async move { (store.name().to_string(), store.query(ctx).await) })
        .collect();

    let (store_outcomes, external_records) = tokio::join!(
        futures::future::join_all(store_futures),
        query_external(external, &ctx.raw_query),
    );

    // 2. Collect store batches, logging failures.
    let mut local_records: Vec<RawResult> = Vec::new();
    for (store, outcome) in store_outcomes {
        match outcome {
            Ok(batch) => {
                tracing::debug!(store = %store, matched = batch.matched, "store returned results");
                local_records.extend(batch.records);
            }
            Err(err) => {
                tracing::warn!(store = %store, error = %err, "store query failed");
            }
        }
    }

    // 3. Aggregate.
    let ranked = aggregate(local_records, external_records, ctx.is_text_search());
    let total_results = ranked.len();

    // 4. Paginate.
    let results = paginate(&ranked, ctx.page, ctx.per_page);
    let message = if total_results == 0 {
        Some(NO_RESULTS_MESSAGE.to_string())
    } else {
        None
    };

    SearchOutcome {
        results,
        total_results,
        page: ctx.page,
        per_page: ctx.per_page,
        took_ms: started.elapsed().as_millis() as u64,
        message,
    }
}

/// Query the external source, converting failure into an empty list.
async fn query_external(
    external: Option<&dyn ExternalSource>,
    raw_query: &str,
) -> Vec<RawResult> {
    let Some(source) = external else {
        return Vec::new();
    };
    match source.search(raw_query).await {
        Ok(records) => {
            tracing::debug!(count = records.len(), "external search returned results");
            records
        }
        Err(err) => {
            tracing::warn!(error = %err, "external search failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SearchError};
    use crate::source::LocalBatch;
    use crate::types::Origin;
    use async_trait::async_trait;

    struct StubStore {
        name: String,
        records: Vec<RawResult>,
        fail: bool,
    }

    impl StubStore {
        fn with_records(records: Vec<RawResult>) -> Self {
            Self {
                name: "stub".to_string(),
                records,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                name: "broken".to_string(),
                records: Vec::new(),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl LocalSource for StubStore {
        fn name(&self) -> &str {
            &self.name
        }

        async fn query(&self, _ctx: &QueryContext) -> Result<LocalBatch> {
            if self.fail {
                return Err(SearchError::Http("store offline".to_string()));
            }
            Ok(LocalBatch::new(self.records.clone()))
        }
    }

    fn record(url: &str, score: f64) -> RawResult {
        RawResult {
            title: Some(url.to_string()),
            url: url.to_string(),
            description: None,
            origin: Origin::Local,
            score: Some(score),
        }
    }

    fn ctx(raw: &str, processed: &str) -> QueryContext {
        QueryContext {
            raw_query: raw.to_string(),
            query: processed.to_string(),
            type_filter: Vec::new(),
            lang_filter: None,
            page: 1,
            per_page: 10,
        }
    }

    #[tokio::test]
    async fn no_sources_yields_message_not_error() {
        let outcome = run_search(&ctx("#all", "#all"), &[], None).await;
        assert_eq!(outcome.total_results, 0);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.message.as_deref(), Some(NO_SOURCES_MESSAGE));
    }

    #[tokio::test]
    async fn failing_store_contributes_nothing() {
        let stores: Vec<Arc<dyn LocalSource>> = vec![
            Arc::new(StubStore::failing()),
            Arc::new(StubStore::with_records(vec![record("https://a.com", 2.0)])),
        ];
        let outcome = run_search(&ctx("query", "query"), &stores, None).await;
        assert_eq!(outcome.total_results, 1);
        assert_eq!(outcome.results[0].url, "https://a.com");
        assert!(outcome.message.is_none());
    }

    #[tokio::test]
    async fn all_stores_failing_yields_no_results_message() {
        let stores: Vec<Arc<dyn LocalSource>> = vec![Arc::new(StubStore::failing())];
        let outcome = run_search(&ctx("query", "query"), &stores, None).await;
        assert_eq!(outcome.total_results, 0);
        assert_eq!(outcome.message.as_deref(), Some(NO_RESULTS_MESSAGE));
    }

    #[tokio::test]
    async fn pagination_applied_while_total_reflects_everything() {
        let records: Vec<RawResult> = (0..12)
            .map(|i| record(&format!("https://site{i}.com"), f64::from(12 - i)))
            .collect();
        let stores: Vec<Arc<dyn LocalSource>> =
            vec![Arc::new(StubStore::with_records(records))];
        let mut context = ctx("query", "query");
        context.per_page = 5;
        context.page = 3;

        let outcome = run_search(&context, &stores, None).await;
        assert_eq!(outcome.total_results, 12);
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.page, 3);
        assert_eq!(outcome.per_page, 5);
    }

    #[tokio::test]
    async fn cross_store_duplicates_collapse() {
        let stores: Vec<Arc<dyn LocalSource>> = vec![
            Arc::new(StubStore::with_records(vec![record("https://a.com/x", 5.0)])),
            Arc::new(StubStore::with_records(vec![record("https://a.com/x/", 3.0)])),
        ];
        let outcome = run_search(&ctx("query", "query"), &stores, None).await;
        assert_eq!(outcome.total_results, 1);
        assert!((outcome.results[0].score - 40.0).abs() < f64::EPSILON);
    }
}
