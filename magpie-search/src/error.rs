//! Error types for the aggregation core.

use thiserror::Error;

/// Errors a source or pipeline step can produce.
///
/// The executor treats every variant the same way at the source boundary:
/// log a warning and contribute nothing. Variants exist so callers and
/// tests can distinguish configuration mistakes from transport failures.
#[derive(Debug, Error)]
pub enum SearchError {
    /// HTTP transport failure or non-success status.
    #[error("http request failed: {0}")]
    Http(String),

    /// Response body did not match the expected shape.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A required credential is missing or empty.
    #[error("missing credentials: {0}")]
    Credentials(String),

    /// A source backend failed to execute a query.
    #[error("source failure: {0}")]
    Source(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = SearchError::Http("connection refused".to_string());
        assert_eq!(err.to_string(), "http request failed: connection refused");

        let err = SearchError::Parse("missing field `items`".to_string());
        assert_eq!(
            err.to_string(),
            "failed to parse response: missing field `items`"
        );

        let err = SearchError::Config("timeout must be non-zero".to_string());
        assert_eq!(err.to_string(), "invalid configuration: timeout must be non-zero");

        let err = SearchError::Credentials("web search API key".to_string());
        assert_eq!(err.to_string(), "missing credentials: web search API key");

        let err = SearchError::Source("database disk image is malformed".to_string());
        assert_eq!(
            err.to_string(),
            "source failure: database disk image is malformed"
        );
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
