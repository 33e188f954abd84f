//! Error types for the magpie application.

/// Top-level error type for the search backend.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration load, parse, or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Document store open or query error.
    #[error("store error: {0}")]
    Store(String),

    /// Outbound HTTP error from a panel or search client.
    #[error("http error: {0}")]
    Http(String),

    /// Malformed or incomplete client request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Panel lookup error.
    #[error("panel error: {0}")]
    Panel(String),

    /// Server lifecycle error (bind, serve).
    #[error("server error: {0}")]
    Server(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<magpie_search::SearchError> for AppError {
    fn from(e: magpie_search::SearchError) -> Self {
        Self::Http(e.to_string())
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;
