//! Client for a Custom Search-style web API.
//!
//! Talks to the provider's JSON endpoint (`GET {base}/customsearch/v1`)
//! and maps the `items` array into [`RawResult`]s in provider order.
//! Responses are cached per query for a fixed TTL so repeated identical
//! queries (page flips, panel refreshes) do not burn API quota.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::http;
use crate::source::ExternalSource;
use crate::types::{Origin, RawResult};

/// Default API origin; overridable for tests and self-hosted proxies.
const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// Cached-entry budget for distinct query strings.
const CACHE_CAPACITY: u64 = 1024;

/// External web search client.
///
/// Cheap to share behind an `Arc`; the response cache lives inside the
/// client, so rebuilding the client (after a settings change) also
/// discards stale cached answers.
pub struct WebSearchClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    engine_id: String,
    max_results: usize,
    /// `None` when caching is disabled (TTL of 0).
    cache: Option<Cache<String, Vec<RawResult>>>,
}

impl WebSearchClient {
    /// Build a client from config plus the provider credentials.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(
        config: &SearchConfig,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Result<Self> {
        let cache = (config.external_cache_ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(Duration::from_secs(config.external_cache_ttl_seconds))
                .build()
        });
        Ok(Self {
            client: http::build_client(config)?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            max_results: config.max_external_results,
            cache,
        })
    }

    /// Point the client at a different API origin (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Whether both credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.engine_id.is_empty()
    }

    async fn fetch(&self, query: &str) -> Result<Vec<RawResult>> {
        tracing::trace!(query, "web search API request");

        let url = format!("{}/customsearch/v1", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("web search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http(format!(
                "web search API returned {status}"
            )));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("web search response malformed: {e}")))?;

        let mut records = to_records(body.items);
        records.truncate(self.max_results);
        tracing::debug!(count = records.len(), "web search results parsed");
        Ok(records)
    }
}

#[async_trait]
impl ExternalSource for WebSearchClient {
    async fn search(&self, raw_query: &str) -> Result<Vec<RawResult>> {
        if !self.is_configured() {
            return Err(SearchError::Credentials(
                "web search API key and engine id are not set".into(),
            ));
        }
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(raw_query).await {
                tracing::trace!(query = raw_query, "web search cache hit");
                return Ok(cached);
            }
        }
        let records = self.fetch(raw_query).await?;
        if let Some(cache) = &self.cache {
            cache.insert(raw_query.to_string(), records.clone()).await;
        }
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    items: Vec<ApiItem>,
}

#[derive(Debug, Deserialize)]
struct ApiItem {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

/// Map API items into records, preserving provider order.
///
/// Items without a link keep their slot as empty-URL records: the
/// aggregator drops them but their rank position still counts toward
/// the score decay, matching the provider's notion of position.
fn to_records(items: Vec<ApiItem>) -> Vec<RawResult> {
    items
        .into_iter()
        .map(|item| RawResult {
            title: item.title,
            url: item.link.unwrap_or_default(),
            description: item.snippet,
            origin: Origin::External,
            score: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_items_in_provider_order() {
        let body: ApiResponse = serde_json::from_str(
            r#"{"items": [
                {"title": "First", "link": "https://a.com", "snippet": "one"},
                {"title": "Second", "link": "https://b.com", "snippet": "two"}
            ]}"#,
        )
        .unwrap();
        let records = to_records(body.items);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].url, "https://a.com");
        assert_eq!(records[1].url, "https://b.com");
        assert_eq!(records[0].origin, Origin::External);
        assert_eq!(records[0].score, None);
    }

    #[test]
    fn missing_items_field_is_empty() {
        let body: ApiResponse = serde_json::from_str(r#"{"kind": "customsearch#search"}"#).unwrap();
        assert!(to_records(body.items).is_empty());
    }

    #[test]
    fn linkless_item_keeps_its_slot() {
        let body: ApiResponse = serde_json::from_str(
            r#"{"items": [
                {"title": "No link here"},
                {"title": "Linked", "link": "https://b.com"}
            ]}"#,
        )
        .unwrap();
        let records = to_records(body.items);
        assert_eq!(records.len(), 2);
        assert!(records[0].url.is_empty());
        assert_eq!(records[1].url, "https://b.com");
    }

    #[test]
    fn unconfigured_client_reports_missing_credentials() {
        let client = WebSearchClient::new(&SearchConfig::default(), "", "").unwrap();
        assert!(!client.is_configured());
    }

    #[test]
    fn configured_client_detected() {
        let client = WebSearchClient::new(&SearchConfig::default(), "key", "cx").unwrap();
        assert!(client.is_configured());
    }

    #[tokio::test]
    async fn search_without_credentials_is_an_error() {
        let client = WebSearchClient::new(&SearchConfig::default(), "", "").unwrap();
        let err = client.search("anything").await.unwrap_err();
        assert!(matches!(err, SearchError::Credentials(_)));
    }

    #[test]
    fn base_url_override() {
        let client = WebSearchClient::new(&SearchConfig::default(), "key", "cx")
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert_eq!(client.base_url, "http://127.0.0.1:9");
    }
}
