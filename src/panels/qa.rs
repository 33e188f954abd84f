//! Q&A panel.
//!
//! Pulls the most relevant Stack Overflow questions for the query from
//! the public Stack Exchange search API (no authentication).

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const DEFAULT_BASE_URL: &str = "https://api.stackexchange.com/2.3";
const SITE: &str = "stackoverflow";
const QUESTION_COUNT: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QaPanel {
    pub title: String,
    pub questions: Vec<QaQuestion>,
}

/// One question entry; field names follow the Stack Exchange wire format
/// so the same struct covers both directions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaQuestion {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub answer_count: i64,
    #[serde(default)]
    pub is_answered: bool,
    #[serde(default)]
    pub creation_date: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<QaQuestion>,
}

/// Client for the Q&A question lookup.
pub struct QaClient {
    client: reqwest::Client,
    base_url: String,
}

impl QaClient {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    /// Override the API endpoint (for tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Top questions whose title matches the query, by relevance.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or a malformed response;
    /// an empty result list resolves to `Ok(None)`.
    pub async fn lookup(&self, query: &str) -> Result<Option<QaPanel>> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("order", "desc"),
                ("sort", "relevance"),
                ("intitle", query),
                ("site", SITE),
            ])
            .send()
            .await
            .map_err(|e| AppError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Panel(format!("question search response: {e}")))?;
        if body.items.is_empty() {
            return Ok(None);
        }
        Ok(Some(QaPanel {
            title: format!("Stack Overflow: {query}"),
            questions: body.items.into_iter().take(QUESTION_COUNT).collect(),
        }))
    }
}
