//! Panel enrichment services.
//!
//! Panels are supplementary blocks (encyclopedia summary, code-hosting
//! profile, coin quote, weather, Q&A snippets, generative answer) shown
//! alongside ranked results. They are looked up concurrently, never
//! influence ranking, and a failing panel is logged and simply absent.
//!
//! Sub-modules:
//! - `knowledge`: Wikipedia REST summaries.
//! - `code`: GitHub organization/user profiles.
//! - `crypto`: CoinGecko quotes with a 7-day chart.
//! - `weather`: wttr.in conditions and forecast.
//! - `qa`: Stack Overflow questions.
//! - `answer`: OpenAI-compatible generative answers and related terms.

pub mod answer;
pub mod code;
pub mod crypto;
pub mod knowledge;
pub mod qa;
pub mod weather;

pub use answer::{AnswerClient, AnswerPanel};
pub use code::{CodeClient, CodePanel};
pub use crypto::{CryptoClient, CryptoPanel};
pub use knowledge::{KnowledgeClient, KnowledgePanel};
pub use qa::{QaClient, QaPanel};
pub use weather::{WeatherClient, WeatherPanel};

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::config::PanelsConfig;
use crate::error::Result;

/// Everything the panel services produced for one query. Absent panels
/// are omitted from the serialized form.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Panels {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<KnowledgePanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodePanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crypto: Option<CryptoPanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherPanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qa: Option<QaPanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerPanel>,
}

impl Panels {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.knowledge.is_none()
            && self.code.is_none()
            && self.crypto.is_none()
            && self.weather.is_none()
            && self.qa.is_none()
            && self.answer.is_none()
    }
}

/// Owns one client per panel service and fans a query out to all of them.
pub struct PanelSet {
    enabled: bool,
    knowledge: KnowledgeClient,
    code: CodeClient,
    crypto: CryptoClient,
    weather: WeatherClient,
    qa: QaClient,
    answer: Arc<AnswerClient>,
}

impl PanelSet {
    #[must_use]
    pub fn new(config: &PanelsConfig, client: &reqwest::Client, answer: Arc<AnswerClient>) -> Self {
        Self {
            enabled: config.enabled,
            knowledge: KnowledgeClient::new(client.clone()),
            code: CodeClient::new(client.clone(), config.github_token.clone()),
            crypto: CryptoClient::new(
                client.clone(),
                config.currency.clone(),
                Duration::from_secs(config.cache_ttl_seconds),
            ),
            weather: WeatherClient::new(client.clone()),
            qa: QaClient::new(client.clone()),
            answer,
        }
    }

    /// A set with every client substituted (for tests against mock APIs).
    #[must_use]
    pub fn from_clients(
        knowledge: KnowledgeClient,
        code: CodeClient,
        crypto: CryptoClient,
        weather: WeatherClient,
        qa: QaClient,
        answer: Arc<AnswerClient>,
    ) -> Self {
        Self {
            enabled: true,
            knowledge,
            code,
            crypto,
            weather,
            qa,
            answer,
        }
    }

    /// Look up every panel for a query, concurrently.
    ///
    /// Empty queries and directive queries (leading `#`, the sentinel
    /// included) produce no panels at all. Individual failures do not
    /// block the other panels.
    pub async fn lookup_all(&self, query: &str, lang: Option<&str>) -> Panels {
        let query = query.trim();
        if !self.enabled || query.is_empty() || query.starts_with('#') {
            return Panels::default();
        }

        let (knowledge, code, crypto, weather, qa, answer) = tokio::join!(
            self.knowledge.lookup(query, lang),
            self.code.lookup(query),
            self.crypto.lookup(query),
            self.weather.lookup(query),
            self.qa.lookup(query),
            self.answer.answer(query),
        );

        Panels {
            knowledge: settle("knowledge", knowledge),
            code: settle("code", code),
            crypto: settle("crypto", crypto),
            weather: settle("weather", weather),
            qa: settle("qa", qa),
            answer: settle("answer", answer),
        }
    }
}

/// Collapse a panel outcome: errors are logged and treated as absent.
fn settle<T>(panel: &str, outcome: Result<Option<T>>) -> Option<T> {
    match outcome {
        Ok(value) => value,
        Err(e) => {
            debug!(panel, error = %e, "panel lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::config::AnswerConfig;
    use crate::error::AppError;

    fn panel_set(enabled: bool) -> PanelSet {
        let client = reqwest::Client::new();
        let answer = Arc::new(AnswerClient::new(client.clone(), &AnswerConfig::default()));
        let config = PanelsConfig {
            enabled,
            ..PanelsConfig::default()
        };
        PanelSet::new(&config, &client, answer)
    }

    #[tokio::test]
    async fn directive_queries_produce_no_panels() {
        let set = panel_set(true);
        assert!(set.lookup_all("#all", None).await.is_empty());
        assert!(set.lookup_all("#system: do things", None).await.is_empty());
        assert!(set.lookup_all("", None).await.is_empty());
        assert!(set.lookup_all("   ", None).await.is_empty());
    }

    #[tokio::test]
    async fn disabled_panels_short_circuit() {
        let set = panel_set(false);
        assert!(set.lookup_all("bitcoin", None).await.is_empty());
    }

    #[test]
    fn settle_drops_errors() {
        assert_eq!(settle("x", Ok(Some(1))), Some(1));
        assert_eq!(settle::<i32>("x", Ok(None)), None);
        assert_eq!(
            settle::<i32>("x", Err(AppError::Panel("boom".to_owned()))),
            None
        );
    }

    #[test]
    fn absent_panels_are_omitted_from_json() {
        let json = serde_json::to_value(Panels::default()).expect("serialize");
        assert_eq!(json, serde_json::json!({}));
    }
}
