//! Core configuration with sensible defaults.
//!
//! [`SearchConfig`] controls outbound HTTP behaviour and cache lifetimes
//! for the aggregation core. The application layer builds one from its own
//! config file and hands it to the clients in this crate.

use crate::error::SearchError;

/// Configuration for the aggregation core.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum number of external results admitted per query.
    pub max_external_results: usize,
    /// How long external API responses stay cached, in seconds.
    /// Set to 0 to disable caching.
    pub external_cache_ttl_seconds: u64,
    /// How long resolved favicons stay cached, in seconds.
    /// Set to 0 to disable caching.
    pub favicon_cache_ttl_seconds: u64,
    /// Custom User-Agent string for page fetches. If `None`, rotates
    /// through a built-in list of realistic browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            max_external_results: 10,
            external_cache_ttl_seconds: 300,
            favicon_cache_ttl_seconds: 3600,
            user_agent: None,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `timeout_seconds` must be greater than 0
    /// - `max_external_results` must be greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.max_external_results == 0 {
            return Err(SearchError::Config(
                "max_external_results must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
