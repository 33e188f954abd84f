//! Favicon discovery for result URLs.
//!
//! Fetches the target page and scans its `<link rel>` tags for a declared
//! icon, falling back to a `HEAD` probe of `/favicon.ico` at the site
//! root. Successful lookups are cached; failures are not, so transient
//! fetch errors do not pin a missing icon.

use moka::future::Cache;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};

const CACHE_CAPACITY: u64 = 4096;

/// Resolves favicon URLs for pages, with caching.
#[derive(Debug, Clone)]
pub struct FaviconResolver {
    client: Client,
    /// `None` when caching is disabled (TTL of 0).
    cache: Option<Cache<String, String>>,
}

impl FaviconResolver {
    /// Create a resolver using the shared HTTP client.
    #[must_use]
    pub fn new(client: Client, config: &SearchConfig) -> Self {
        let cache = (config.favicon_cache_ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(std::time::Duration::from_secs(
                    config.favicon_cache_ttl_seconds,
                ))
                .build()
        });
        Self { client, cache }
    }

    /// Resolve the favicon URL for a page, or `None` when the page has no
    /// discoverable icon or cannot be fetched.
    pub async fn resolve(&self, page_url: &str) -> Option<String> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(page_url).await {
                tracing::trace!(url = page_url, "favicon cache hit");
                return Some(cached);
            }
        }

        match self.discover(page_url).await {
            Ok(icon) => {
                if let Some(cache) = &self.cache {
                    cache.insert(page_url.to_owned(), icon.clone()).await;
                }
                Some(icon)
            }
            Err(err) => {
                tracing::debug!(url = page_url, error = %err, "favicon lookup failed");
                None
            }
        }
    }

    async fn discover(&self, page_url: &str) -> Result<String> {
        let base = parse_page_url(page_url)?;

        let response = self
            .client
            .get(base.clone())
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("favicon page fetch failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http(format!(
                "favicon page fetch returned {status}"
            )));
        }
        let html = response
            .text()
            .await
            .map_err(|e| SearchError::Http(format!("favicon page read failed: {e}")))?;

        if let Some(declared) = declared_icon(&html, &base) {
            return Ok(declared);
        }

        self.probe_default_icon(&base).await
    }

    /// `HEAD` the conventional `/favicon.ico` location at the site root.
    async fn probe_default_icon(&self, base: &Url) -> Result<String> {
        let icon_url = base
            .join("/favicon.ico")
            .map_err(|e| SearchError::Parse(format!("favicon url join failed: {e}")))?;

        let response = self
            .client
            .head(icon_url.clone())
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("favicon probe failed: {e}")))?;
        if !response.status().is_success() {
            return Err(SearchError::Http(format!(
                "no favicon at {icon_url} ({})",
                response.status()
            )));
        }

        Ok(icon_url.to_string())
    }
}

/// Parse a page URL, tolerating a missing scheme.
fn parse_page_url(raw: &str) -> Result<Url> {
    match Url::parse(raw) {
        Ok(url) if url.has_host() => Ok(url),
        _ => Url::parse(&format!("http://{raw}"))
            .ok()
            .filter(Url::has_host)
            .ok_or_else(|| SearchError::Parse(format!("invalid page url: {raw}"))),
    }
}

/// First icon declared in the page head, absolutised against the page URL.
///
/// Matches any `<link>` whose `rel` mentions an icon, which covers the
/// common variants (`icon`, `shortcut icon`, `apple-touch-icon`).
fn declared_icon(html: &str, base: &Url) -> Option<String> {
    let selector = Selector::parse("link[rel][href]").ok()?;
    let document = Html::parse_document(html);

    for link in document.select(&selector) {
        let Some(rel) = link.value().attr("rel") else {
            continue;
        };
        if !rel.to_ascii_lowercase().contains("icon") {
            continue;
        }
        let href = link.value().attr("href").unwrap_or("").trim();
        if href.is_empty() {
            continue;
        }
        if let Ok(resolved) = base.join(href) {
            return Some(resolved.to_string());
        }
    }
    None
}
