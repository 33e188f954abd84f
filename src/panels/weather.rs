//! Weather panel.
//!
//! Detects weather-shaped queries in a handful of languages, extracts the
//! location, and fetches conditions and a 3-day forecast from the wttr.in
//! JSON endpoint (no API key required).

use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, Result};

const DEFAULT_BASE_URL: &str = "https://wttr.in";
const FORECAST_DAYS: usize = 3;

/// Terms that mark a query as weather-related (en/de/es/fr).
const WEATHER_KEYWORDS: &[&str] = &[
    "weather", "wetter", "tiempo", "météo", "meteo",
    "forecast", "temperature", "temperatur", "temperatura",
    "rain", "regen", "lluvia", "pluie",
    "snow", "schnee", "nieve", "neige",
    "humidity", "feuchtigkeit", "humedad", "humidité",
    "sunny", "sonnig", "soleado", "ensoleillé",
    "cloudy", "bewölkt", "nublado", "nuageux",
    "climate", "klima", "clima", "climat",
];

/// "<keyword> in <location>" prefixes, longest variants first where they
/// overlap so "weather forecast for" beats "forecast for".
const LOCATION_PREFIXES: &[&str] = &[
    "weather in ", "wetter in ", "tiempo en ", "météo à ",
    "weather forecast for ", "forecast for ", "temperature in ",
    "temperatur in ", "temperatura en ", "température à ",
];

/// "<location> <keyword>" suffixes.
const LOCATION_SUFFIXES: &[&str] = &[
    " weather", " wetter", " tiempo", " météo",
    " forecast", " temperature", " temperatur", " temperatura",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeatherPanel {
    pub location: WeatherLocation,
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
    pub updated: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeatherLocation {
    pub name: String,
    pub region: String,
    pub country: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CurrentConditions {
    pub temp_c: String,
    pub temp_f: String,
    pub feels_like_c: String,
    pub feels_like_f: String,
    pub weather_desc: String,
    pub humidity: String,
    pub wind_speed: String,
    pub wind_dir: String,
    pub weather_icon: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ForecastDay {
    pub date: String,
    pub max_temp_c: String,
    pub min_temp_c: String,
    pub weather_desc: String,
    pub weather_icon: String,
}

/// Client for the weather lookup.
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
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

    /// Build a weather panel when the query looks like a weather question
    /// and names a location.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or a malformed response.
    pub async fn lookup(&self, query: &str) -> Result<Option<WeatherPanel>> {
        if !is_weather_query(query) {
            return Ok(None);
        }
        let location = extract_location(query);
        if location.is_empty() {
            return Ok(None);
        }
        self.fetch(&location).await
    }

    /// Fetch conditions for an explicit location.
    async fn fetch(&self, location: &str) -> Result<Option<WeatherPanel>> {
        let formatted = location.replace(' ', "+");
        let url = format!("{}/{formatted}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("format", "j1"), ("lang", "en")])
            .send()
            .await
            .map_err(|e| AppError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::Panel(format!("weather response: {e}")))?;
        Ok(Some(assemble(&data)))
    }
}

/// Whether the query looks like a weather question.
#[must_use]
pub fn is_weather_query(query: &str) -> bool {
    let q = query.to_lowercase();
    if WEATHER_KEYWORDS.iter().any(|kw| q.contains(kw)) {
        return true;
    }
    ["weather in", "wetter in", "tiempo en", "météo à"]
        .iter()
        .any(|p| q.contains(p))
        || [" weather", " wetter", " tiempo", " météo"]
            .iter()
            .any(|s| q.ends_with(s))
}

/// Pull the location out of a weather query.
///
/// Works on the lowercased text; the weather provider resolves locations
/// case-insensitively. Returns the whole (lowercased) query when nothing
/// better can be isolated.
#[must_use]
pub fn extract_location(query: &str) -> String {
    let q = query.trim().to_lowercase();

    for prefix in LOCATION_PREFIXES {
        if let Some(pos) = q.find(prefix) {
            let location = q[pos + prefix.len()..].trim();
            if !location.is_empty() {
                return location.to_owned();
            }
        }
    }
    for suffix in LOCATION_SUFFIXES {
        if let Some(stripped) = q.strip_suffix(suffix) {
            let location = stripped.trim();
            if !location.is_empty() {
                return location.to_owned();
            }
        }
    }

    // Last resort: strip every weather term and keep what remains.
    let mut cleaned = q.clone();
    for term in WEATHER_KEYWORDS {
        cleaned = cleaned.replace(term, "");
    }
    let cleaned = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches([' ', ',', '.', ';', ':', '-', '?', '!'])
        .to_owned();
    if cleaned.is_empty() { q } else { cleaned }
}

fn assemble(data: &Value) -> WeatherPanel {
    let current = &data["current_condition"][0];
    let area = &data["nearest_area"][0];

    let name = {
        let n = wrapped_value(area, "areaName", "");
        if n.is_empty() { "Unknown".to_owned() } else { n }
    };
    let region = wrapped_str(&area["region"][0]);
    let country = wrapped_str(&area["country"][0]);
    let full_name = [name.as_str(), region.as_str(), country.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

    let forecast = data["weather"]
        .as_array()
        .map(|days| {
            days.iter()
                .take(FORECAST_DAYS)
                .map(|day| {
                    let hourly = &day["hourly"][0];
                    ForecastDay {
                        date: format_forecast_date(day["date"].as_str().unwrap_or_default()),
                        max_temp_c: plain_str(&day["maxtempC"]),
                        min_temp_c: plain_str(&day["mintempC"]),
                        weather_desc: wrapped_value(hourly, "weatherDesc", "Unknown"),
                        weather_icon: wrapped_value(hourly, "weatherIconUrl", ""),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    WeatherPanel {
        location: WeatherLocation {
            name: name.clone(),
            region,
            country,
            full_name,
        },
        current: CurrentConditions {
            temp_c: plain_str(&current["temp_C"]),
            temp_f: plain_str(&current["temp_F"]),
            feels_like_c: plain_str(&current["FeelsLikeC"]),
            feels_like_f: plain_str(&current["FeelsLikeF"]),
            weather_desc: wrapped_value(current, "weatherDesc", "Unknown"),
            humidity: plain_str(&current["humidity"]),
            wind_speed: plain_str(&current["windspeedKmph"]),
            wind_dir: plain_str(&current["winddir16Point"]),
            weather_icon: wrapped_value(current, "weatherIconUrl", ""),
        },
        forecast,
        updated: chrono::Local::now().format("%H:%M, %d %b %Y").to_string(),
    }
}

/// `"2026-08-23"` → `"Sun, 23 Aug"`; unparsable dates pass through.
fn format_forecast_date(date: &str) -> String {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%a, %d %b").to_string())
        .unwrap_or_else(|_| date.to_owned())
}

/// The wttr.in `[{"value": "..."}]` wrapper convention.
fn wrapped_value(node: &Value, key: &str, default: &str) -> String {
    node[key][0]["value"].as_str().unwrap_or(default).to_owned()
}

fn wrapped_str(node: &Value) -> String {
    node["value"].as_str().unwrap_or_default().to_owned()
}

fn plain_str(node: &Value) -> String {
    node.as_str().unwrap_or("N/A").to_owned()
}
