//! Application configuration loaded from `config.toml`.
//!
//! All sections default sensibly, so a missing file or a file with only a
//! few keys both work. Credentials can be supplied through the environment
//! instead of the file (`MAGPIE_WEB_API_KEY`, `MAGPIE_WEB_ENGINE_ID`,
//! `MAGPIE_GITHUB_TOKEN`, `MAGPIE_ANSWER_API_KEY`); env values override
//! file values after load.
//!
//! Saving goes through a temp file and a rename so a crash mid-write never
//! leaves a truncated config behind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::magpie_dirs;

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind. Use 0 for auto-assign (tests).
    pub port: u16,
    /// Results per page.
    pub per_page: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 5560,
            per_page: 10,
        }
    }
}

/// External web-search API and shared HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    /// API key for the external web-search service. Empty disables the
    /// external source.
    pub api_key: String,
    /// Search engine identifier passed alongside the key.
    pub engine_id: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum external results admitted per query.
    pub max_results: usize,
    /// External response cache TTL in seconds. 0 disables caching.
    pub cache_ttl_seconds: u64,
    /// Favicon cache TTL in seconds. 0 disables caching.
    pub favicon_cache_ttl_seconds: u64,
    /// Custom User-Agent for page fetches. `None` rotates through
    /// built-in browser strings.
    pub user_agent: Option<String>,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            engine_id: String::new(),
            timeout_seconds: 10,
            max_results: 10,
            cache_ttl_seconds: 300,
            favicon_cache_ttl_seconds: 3600,
            user_agent: None,
        }
    }
}

/// One document store entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Display name, also used in logs.
    pub name: String,
    /// Database file path. Relative paths resolve against the stores
    /// directory under the data dir.
    pub path: PathBuf,
    /// Disabled stores stay in the config but are not opened.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl StoreConfig {
    /// Absolute database path, resolving relative paths against
    /// [`magpie_dirs::stores_dir`].
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            magpie_dirs::stores_dir().join(&self.path)
        }
    }
}

/// Document type taxonomy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypesConfig {
    /// Canonical type name → all member spellings (including the canonical
    /// one). A selected filter type expands to its whole group; distinct
    /// store types collapse to the canonical name.
    pub synonyms: BTreeMap<String, Vec<String>>,
}

/// Enrichment panel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelsConfig {
    /// Master switch for all panels.
    pub enabled: bool,
    /// Optional code-hosting API token; raises the unauthenticated rate
    /// limit. Empty sends no auth header.
    pub github_token: String,
    /// Display currency for the crypto panel (lowercase code).
    pub currency: String,
    /// Panel response cache TTL in seconds. 0 disables caching.
    pub cache_ttl_seconds: u64,
    /// Generative answer settings.
    pub answer: AnswerConfig,
}

impl Default for PanelsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            github_token: String::new(),
            currency: "usd".to_owned(),
            cache_ttl_seconds: 300,
            answer: AnswerConfig::default(),
        }
    }
}

/// OpenAI-compatible chat completion settings for the answer panel and
/// related-term generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    /// Base URL including the version segment, e.g.
    /// `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token. Empty disables the answer panel.
    pub api_key: String,
    /// Model identifier sent with each request.
    pub model: String,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_owned(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_owned(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// External web-search and HTTP client settings.
    pub search: WebSearchConfig,
    /// Document store entries.
    pub stores: Vec<StoreConfig>,
    /// Type taxonomy.
    pub types: TypesConfig,
    /// Enrichment panel settings.
    pub panels: PanelsConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Load from `path` if it exists, otherwise return defaults.
    ///
    /// A present-but-invalid file is an error; silently replacing a broken
    /// config with defaults would hide the mistake.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration atomically: write a temp file next to `path`,
    /// then rename over it. Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem step fails.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Returns the default config file path under the platform config dir.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        magpie_dirs::config_file()
    }

    /// Overlay credential fields from the environment. Empty env values
    /// are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("MAGPIE_WEB_API_KEY")
            && !key.trim().is_empty()
        {
            self.search.api_key = key;
        }
        if let Ok(id) = std::env::var("MAGPIE_WEB_ENGINE_ID")
            && !id.trim().is_empty()
        {
            self.search.engine_id = id;
        }
        if let Ok(token) = std::env::var("MAGPIE_GITHUB_TOKEN")
            && !token.trim().is_empty()
        {
            self.panels.github_token = token;
        }
        if let Ok(key) = std::env::var("MAGPIE_ANSWER_API_KEY")
            && !key.trim().is_empty()
        {
            self.panels.answer.api_key = key;
        }
    }

    /// Project the search-relevant fields into the core crate's config.
    #[must_use]
    pub fn search_config(&self) -> magpie_search::SearchConfig {
        magpie_search::SearchConfig {
            timeout_seconds: self.search.timeout_seconds,
            max_external_results: self.search.max_results,
            external_cache_ttl_seconds: self.search.cache_ttl_seconds,
            favicon_cache_ttl_seconds: self.search.favicon_cache_ttl_seconds,
            user_agent: self.search.user_agent.clone(),
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric bound is violated or a store entry is
    /// unusable.
    pub fn validate(&self) -> Result<()> {
        if self.server.per_page == 0 {
            return Err(AppError::Config(
                "server.per_page must be greater than 0".to_owned(),
            ));
        }
        self.search_config()
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        for store in &self.stores {
            if store.name.trim().is_empty() {
                return Err(AppError::Config("store with empty name".to_owned()));
            }
            if store.path.as_os_str().is_empty() {
                return Err(AppError::Config(format!(
                    "store '{}' has an empty path",
                    store.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 5560);
        assert_eq!(config.server.per_page, 10);
        assert!(config.stores.is_empty());
        assert!(config.panels.enabled);
        assert!(config.panels.answer.api_key.is_empty());
    }

    #[test]
    fn zero_per_page_rejected() {
        let config = AppConfig {
            server: ServerConfig {
                per_page: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("per_page"));
    }

    #[test]
    fn empty_store_name_rejected() {
        let config = AppConfig {
            stores: vec![StoreConfig {
                name: "  ".to_owned(),
                path: PathBuf::from("x.db"),
                enabled: true,
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[server]
port = 8080
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.per_page, 10);
        assert_eq!(config.search.cache_ttl_seconds, 300);
    }

    #[test]
    fn store_entries_parse_with_default_enabled() {
        let toml_str = r#"
[[stores]]
name = "docs"
path = "docs.db"

[[stores]]
name = "wiki"
path = "/var/lib/magpie/wiki.db"
enabled = false
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.stores.len(), 2);
        assert!(config.stores[0].enabled);
        assert!(!config.stores[1].enabled);
    }

    #[test]
    fn synonyms_parse_as_groups() {
        let toml_str = r#"
[types.synonyms]
wiki = ["wiki", "wikis", "encyclopedia"]
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.types.synonyms.get("wiki").map(Vec::len), Some(3));
    }

    #[test]
    fn absolute_store_path_is_kept() {
        let store = StoreConfig {
            name: "docs".to_owned(),
            path: PathBuf::from("/srv/magpie/docs.db"),
            enabled: true,
        };
        assert_eq!(store.resolved_path(), PathBuf::from("/srv/magpie/docs.db"));
    }

    #[test]
    fn relative_store_path_resolves_under_stores_dir() {
        let store = StoreConfig {
            name: "docs".to_owned(),
            path: PathBuf::from("docs.db"),
            enabled: true,
        };
        let resolved = store.resolved_path();
        assert!(
            resolved.ends_with("stores/docs.db"),
            "{}",
            resolved.display()
        );
    }

    #[test]
    fn env_overrides_apply_when_set() {
        let keys = [
            "MAGPIE_WEB_API_KEY",
            "MAGPIE_WEB_ENGINE_ID",
            "MAGPIE_GITHUB_TOKEN",
            "MAGPIE_ANSWER_API_KEY",
        ];
        let originals: Vec<_> = keys.iter().map(|k| std::env::var_os(k)).collect();

        // SAFETY: Tests run single-threaded per module.
        unsafe {
            std::env::set_var("MAGPIE_WEB_API_KEY", "env-key");
            std::env::set_var("MAGPIE_WEB_ENGINE_ID", "env-cx");
            std::env::set_var("MAGPIE_GITHUB_TOKEN", "env-token");
            std::env::set_var("MAGPIE_ANSWER_API_KEY", "env-answer");
        }

        let mut config = AppConfig::default();
        config.apply_env_overrides();
        assert_eq!(config.search.api_key, "env-key");
        assert_eq!(config.search.engine_id, "env-cx");
        assert_eq!(config.panels.github_token, "env-token");
        assert_eq!(config.panels.answer.api_key, "env-answer");

        // Restore.
        for (key, original) in keys.iter().zip(originals) {
            match original {
                Some(val) => unsafe { std::env::set_var(key, val) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }

    #[test]
    fn search_config_projection_carries_fields() {
        let config = AppConfig {
            search: WebSearchConfig {
                timeout_seconds: 5,
                max_results: 7,
                cache_ttl_seconds: 60,
                favicon_cache_ttl_seconds: 0,
                user_agent: Some("MagpieBot/1.0".to_owned()),
                ..Default::default()
            },
            ..Default::default()
        };
        let sc = config.search_config();
        assert_eq!(sc.timeout_seconds, 5);
        assert_eq!(sc.max_external_results, 7);
        assert_eq!(sc.external_cache_ttl_seconds, 60);
        assert_eq!(sc.favicon_cache_ttl_seconds, 0);
        assert_eq!(sc.user_agent.as_deref(), Some("MagpieBot/1.0"));
    }
}
