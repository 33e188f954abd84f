//! Encyclopedia knowledge panel.
//!
//! Backed by the Wikipedia REST summary endpoint. The article language
//! follows the request language for the handful of editions the UI offers;
//! everything else falls back to English.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Wikipedia editions the panel can serve, by request-language prefix.
const SUPPORTED_LANGS: &[&str] = &["de", "fr", "es", "it"];
const DEFAULT_LANG: &str = "en";

/// Summary text cap, in characters.
const SUMMARY_LIMIT: usize = 500;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KnowledgePanel {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub image_url: Option<String>,
    pub wiki_lang: String,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(default, rename = "type")]
    kind: String,
    content_urls: Option<ContentUrls>,
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<PageUrl>,
}

#[derive(Debug, Deserialize)]
struct PageUrl {
    page: String,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: String,
}

/// Client for the encyclopedia summary lookup.
pub struct KnowledgeClient {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl KnowledgeClient {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    /// Override the API endpoint (single-language, for tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Look up an article summary for the query.
    ///
    /// Returns `Ok(None)` for queries too short or generic to name an
    /// article, for unknown articles (404), and for disambiguation pages.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or unexpected statuses.
    pub async fn lookup(&self, query: &str, lang: Option<&str>) -> Result<Option<KnowledgePanel>> {
        let clean = clean_query(query);
        let words = clean.split_whitespace().count();
        // Single short words are rarely article titles.
        if clean.is_empty() || (words <= 1 && clean.chars().count() < 4) {
            return Ok(None);
        }

        let wiki_lang = edition_for(lang);
        let title = urlencoding::encode(&clean.replace(' ', "_")).into_owned();
        let url = match &self.base_url {
            Some(base) => format!("{base}/page/summary/{title}"),
            None => format!("https://{wiki_lang}.wikipedia.org/api/rest_v1/page/summary/{title}"),
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Http(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::Panel(format!(
                "encyclopedia lookup returned {}",
                response.status()
            )));
        }

        let summary: SummaryResponse = response
            .json()
            .await
            .map_err(|e| AppError::Panel(format!("encyclopedia response: {e}")))?;

        // A disambiguation extract lists meanings rather than describing one.
        if summary.kind == "disambiguation" || summary.extract.is_empty() {
            return Ok(None);
        }

        let page_url = summary
            .content_urls
            .and_then(|c| c.desktop)
            .map_or_else(
                || format!("https://{wiki_lang}.wikipedia.org/wiki/{title}"),
                |d| d.page,
            );

        Ok(Some(KnowledgePanel {
            title: summary.title,
            summary: truncate_summary(&summary.extract),
            url: page_url,
            image_url: summary.thumbnail.map(|t| t.source),
            wiki_lang: wiki_lang.to_owned(),
        }))
    }
}

/// Pick the Wikipedia edition for a request language like `de-DE`.
fn edition_for(lang: Option<&str>) -> &'static str {
    let Some(lang) = lang else {
        return DEFAULT_LANG;
    };
    SUPPORTED_LANGS
        .iter()
        .find(|prefix| lang.starts_with(**prefix))
        .copied()
        .unwrap_or(DEFAULT_LANG)
}

/// Keep word characters and spaces, drop the rest.
fn clean_query(query: &str) -> String {
    query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect::<String>()
        .trim()
        .to_owned()
}

fn truncate_summary(extract: &str) -> String {
    if extract.chars().count() > SUMMARY_LIMIT {
        let cut: String = extract.chars().take(SUMMARY_LIMIT).collect();
        format!("{cut}...")
    } else {
        extract.to_owned()
    }
}
