//! Generative answer panel and related-term suggestions.
//!
//! Talks to any OpenAI-compatible chat completions endpoint
//! (configurable base URL, key, and model), non-streaming. Without an
//! API key the panel stays absent and related terms fall back to the
//! deterministic list.

use serde::Serialize;
use serde_json::Value;

use crate::config::AnswerConfig;
use crate::error::{AppError, Result};
use crate::text::fallback_related_terms;

/// How many related terms a query gets.
const RELATED_TERM_COUNT: usize = 6;

/// Page content cap handed to the model for condensation, in characters.
const CONDENSE_CONTENT_LIMIT: usize = 5000;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnswerPanel {
    pub text: String,
    pub model: String,
}

/// Client for the chat completions endpoint.
pub struct AnswerClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnswerClient {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &AnswerConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Generate the answer panel text for a query.
    ///
    /// Returns `Ok(None)` when no key is configured or the model returns
    /// nothing usable.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or non-success statuses.
    pub async fn answer(&self, query: &str) -> Result<Option<AnswerPanel>> {
        if !self.is_configured() {
            return Ok(None);
        }
        let prompt =
            format!("Please answer this question: {query}. Please show your sources.");
        let text = self.chat(&prompt).await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(AnswerPanel {
            text,
            model: self.model.clone(),
        }))
    }

    /// Related search terms for a query.
    ///
    /// Generation failures of any kind fall back to the deterministic
    /// suggestion list, so this never fails.
    pub async fn related_terms(&self, query: &str) -> Vec<String> {
        if !self.is_configured() {
            return fallback_related_terms(query);
        }
        let prompt = format!(
            "Based on the search query \"{query}\", provide exactly {RELATED_TERM_COUNT} related \
             search terms that users might be interested in. These should be highly relevant to \
             the original query but add useful variations or specifications. Format your response \
             as a simple list of terms only, one per line, with no explanations or numbering. Do \
             not repeat the exact original query in your suggestions."
        );
        match self.chat(&prompt).await {
            Ok(text) => {
                let terms: Vec<String> = text
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .take(RELATED_TERM_COUNT)
                    .map(str::to_owned)
                    .collect();
                if terms.is_empty() {
                    fallback_related_terms(query)
                } else {
                    terms
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "related-term generation failed, using fallback");
                fallback_related_terms(query)
            }
        }
    }

    /// Condense extracted page content into a 2-3 sentence summary.
    ///
    /// Returns `Ok(None)` when no key is configured or the model returns
    /// nothing usable; callers keep their extractive summary in that case.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or non-success statuses.
    pub async fn condense(&self, title: &str, content: &str) -> Result<Option<String>> {
        if !self.is_configured() || content.trim().is_empty() {
            return Ok(None);
        }
        let clipped: String = content.chars().take(CONDENSE_CONTENT_LIMIT).collect();
        let prompt = format!(
            "Please write a concise summary of the following web page in at most 2-3 sentences, \
             conveying its main idea.\n\nPage: {title}\nContent: {clipped}"
        );
        let text = self.chat(&prompt).await?;
        let text = text.trim();
        // Single-character noise answers are worse than the extract.
        if text.len() <= 5 {
            return Ok(None);
        }
        Ok(Some(text.to_owned()))
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        });
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AppError::Panel(format!(
                "completion request returned {}",
                response.status()
            )));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Panel(format!("completion response: {e}")))?;
        Ok(body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_owned())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn client(api_key: &str) -> AnswerClient {
        AnswerClient::new(
            reqwest::Client::new(),
            &AnswerConfig {
                base_url: "http://127.0.0.1:1/v1".to_owned(),
                api_key: api_key.to_owned(),
                model: "test-model".to_owned(),
            },
        )
    }

    #[test]
    fn configured_requires_a_key() {
        assert!(!client("").is_configured());
        assert!(client("sk-test").is_configured());
    }

    #[tokio::test]
    async fn unconfigured_answer_is_absent() {
        let panel = client("").answer("what is rust").await.expect("answer");
        assert!(panel.is_none());
    }

    #[tokio::test]
    async fn unconfigured_related_terms_use_fallback() {
        let terms = client("").related_terms("nextcloud").await;
        assert_eq!(terms.len(), 6);
        assert!(terms.contains(&"nextcloud installation".to_owned()));
    }

    #[tokio::test]
    async fn unconfigured_condense_is_absent() {
        let summary = client("")
            .condense("Title", "Some content")
            .await
            .expect("condense");
        assert!(summary.is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = AnswerClient::new(
            reqwest::Client::new(),
            &AnswerConfig {
                base_url: "https://api.example.com/v1/".to_owned(),
                api_key: String::new(),
                model: "m".to_owned(),
            },
        );
        assert_eq!(c.base_url, "https://api.example.com/v1");
    }
}
