//! Cryptocurrency quote panel.
//!
//! Detects coin names and tickers in the query and fetches market data
//! and a 7-day price chart from the CoinGecko API. Responses are cached
//! briefly; the public API is tightly rate-limited.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, Result};

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const CHART_DAYS: &str = "7";

/// Recognized coin keywords, checked in order: exact match first, then
/// first keyword contained in the query.
const COIN_KEYWORDS: &[(&str, &str)] = &[
    ("bitcoin", "bitcoin"),
    ("btc", "bitcoin"),
    ("ethereum", "ethereum"),
    ("eth", "ethereum"),
    ("cardano", "cardano"),
    ("ada", "cardano"),
    ("solana", "solana"),
    ("sol", "solana"),
    ("binance coin", "binancecoin"),
    ("bnb", "binancecoin"),
    ("ripple", "ripple"),
    ("xrp", "ripple"),
    ("dogecoin", "dogecoin"),
    ("doge", "dogecoin"),
    ("polkadot", "polkadot"),
    ("dot", "polkadot"),
    ("tether", "tether"),
    ("usdt", "tether"),
    ("litecoin", "litecoin"),
    ("ltc", "litecoin"),
    ("chainlink", "chainlink"),
    ("link", "chainlink"),
    ("uniswap", "uniswap"),
    ("uni", "uniswap"),
    ("bitcoin cash", "bitcoin-cash"),
    ("bch", "bitcoin-cash"),
    ("stellar", "stellar"),
    ("xlm", "stellar"),
    ("polygon", "matic-network"),
    ("matic", "matic-network"),
    ("avalanche", "avalanche-2"),
    ("avax", "avalanche-2"),
];

/// Brand colors per coin id, for the chart accent.
const COIN_COLORS: &[(&str, &str)] = &[
    ("bitcoin", "#F7931A"),
    ("ethereum", "#627EEA"),
    ("cardano", "#0033AD"),
    ("solana", "#00FFA3"),
    ("binancecoin", "#F3BA2F"),
    ("ripple", "#23292F"),
    ("dogecoin", "#C3A634"),
    ("polkadot", "#E6007A"),
    ("tether", "#26A17B"),
    ("litecoin", "#345D9D"),
    ("chainlink", "#2A5ADA"),
    ("uniswap", "#FF007A"),
    ("bitcoin-cash", "#8DC351"),
    ("stellar", "#7D00FF"),
    ("matic-network", "#8247E5"),
    ("avalanche-2", "#E84142"),
];
const DEFAULT_COLOR: &str = "#F7931A";

const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("usd", "$"),
    ("eur", "€"),
    ("gbp", "£"),
    ("jpy", "¥"),
    ("cny", "¥"),
    ("krw", "₩"),
    ("inr", "₹"),
];
const DEFAULT_CURRENCY_SYMBOL: &str = "$";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CryptoPanel {
    pub name: String,
    pub symbol: String,
    pub icon_url: Option<String>,
    pub price: f64,
    pub currency_symbol: String,
    pub price_change_24h: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub circulating_supply: f64,
    pub ath: f64,
    pub description: String,
    pub website: String,
    pub explorer: String,
    pub chart_data: Option<ChartData>,
    pub color: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub prices: Vec<f64>,
}

/// Client for the coin market data lookup.
pub struct CryptoClient {
    client: reqwest::Client,
    base_url: String,
    currency: String,
    cache: Option<moka::future::Cache<String, CryptoPanel>>,
}

impl CryptoClient {
    /// `cache_ttl` of zero disables caching.
    #[must_use]
    pub fn new(client: reqwest::Client, currency: impl Into<String>, cache_ttl: Duration) -> Self {
        let cache = (!cache_ttl.is_zero()).then(|| {
            moka::future::Cache::builder()
                .max_capacity(256)
                .time_to_live(cache_ttl)
                .build()
        });
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
            currency: currency.into(),
            cache,
        }
    }

    /// Override the API endpoint (for tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build a quote panel when the query names a known coin.
    ///
    /// # Errors
    ///
    /// Returns an error when the market data request fails; chart failures
    /// degrade to a panel without chart points.
    pub async fn lookup(&self, query: &str) -> Result<Option<CryptoPanel>> {
        let Some(coin_id) = coin_id_for(query) else {
            return Ok(None);
        };

        let cache_key = format!("{coin_id}:{}", self.currency);
        if let Some(cache) = &self.cache {
            if let Some(panel) = cache.get(&cache_key).await {
                return Ok(Some(panel));
            }
        }

        let coin_url = format!("{}/coins/{coin_id}", self.base_url);
        let coin: Value = self
            .fetch_json(&coin_url, &[
                ("localization", "false"),
                ("tickers", "false"),
                ("market_data", "true"),
                ("community_data", "false"),
                ("developer_data", "false"),
            ])
            .await?;
        if coin["market_data"].is_null() {
            return Ok(None);
        }

        // Chart history is best-effort.
        let chart_url = format!("{}/coins/{coin_id}/market_chart", self.base_url);
        let chart = self
            .fetch_json(&chart_url, &[("vs_currency", self.currency.as_str()), ("days", CHART_DAYS)])
            .await
            .ok();

        let panel = assemble(coin_id, &coin, chart.as_ref(), &self.currency);
        if let Some(cache) = &self.cache {
            cache.insert(cache_key, panel.clone()).await;
        }
        Ok(Some(panel))
    }

    async fn fetch_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AppError::Panel(format!(
                "coin data request returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| AppError::Panel(format!("coin data response: {e}")))
    }
}

/// Resolve the query to a coin id: exact keyword match first, then the
/// first keyword contained in the query.
fn coin_id_for(query: &str) -> Option<&'static str> {
    let q = query.trim().to_lowercase();
    if let Some((_, id)) = COIN_KEYWORDS.iter().find(|(kw, _)| *kw == q) {
        return Some(id);
    }
    COIN_KEYWORDS
        .iter()
        .find(|(kw, _)| q.contains(kw))
        .map(|(_, id)| *id)
}

fn assemble(coin_id: &str, coin: &Value, chart: Option<&Value>, currency: &str) -> CryptoPanel {
    let market = &coin["market_data"];
    CryptoPanel {
        name: coin["name"].as_str().unwrap_or_default().to_owned(),
        symbol: coin["symbol"].as_str().unwrap_or_default().to_uppercase(),
        icon_url: coin["image"]["small"].as_str().map(str::to_owned),
        price: market["current_price"][currency].as_f64().unwrap_or(0.0),
        currency_symbol: CURRENCY_SYMBOLS
            .iter()
            .find(|(c, _)| *c == currency)
            .map_or(DEFAULT_CURRENCY_SYMBOL, |(_, s)| s)
            .to_owned(),
        price_change_24h: market["price_change_percentage_24h"].as_f64().unwrap_or(0.0),
        market_cap: market["market_cap"][currency].as_f64().unwrap_or(0.0),
        volume_24h: market["total_volume"][currency].as_f64().unwrap_or(0.0),
        circulating_supply: market["circulating_supply"].as_f64().unwrap_or(0.0),
        ath: market["ath"][currency].as_f64().unwrap_or(0.0),
        description: coin["description"]["en"].as_str().unwrap_or_default().to_owned(),
        website: coin["links"]["homepage"][0].as_str().unwrap_or_default().to_owned(),
        explorer: coin["links"]["blockchain_site"][0]
            .as_str()
            .unwrap_or_default()
            .to_owned(),
        chart_data: chart.and_then(build_chart),
        color: COIN_COLORS
            .iter()
            .find(|(id, _)| *id == coin_id)
            .map_or(DEFAULT_COLOR, |(_, c)| c)
            .to_owned(),
        source: "CoinGecko".to_owned(),
    }
}

/// Convert `[[timestamp_ms, price], ...]` into labelled chart points.
fn build_chart(chart: &Value) -> Option<ChartData> {
    let entries = chart["prices"].as_array()?;
    let mut labels = Vec::with_capacity(entries.len());
    let mut prices = Vec::with_capacity(entries.len());
    for entry in entries {
        let (Some(ts), Some(price)) = (entry[0].as_f64(), entry[1].as_f64()) else {
            continue;
        };
        let Some(dt) = chrono::DateTime::from_timestamp_millis(ts as i64) else {
            continue;
        };
        labels.push(dt.format("%d.%m %H:%M").to_string());
        prices.push(price);
    }
    if prices.is_empty() {
        return None;
    }
    Some(ChartData { labels, prices })
}
