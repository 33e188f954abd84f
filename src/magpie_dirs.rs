//! Centralized application directory paths for magpie.
//!
//! Provides a single source of truth for all filesystem paths used by the
//! server. Uses the [`dirs`] crate for platform-appropriate directory
//! resolution.
//!
//! # Directory Layout
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | App data | `~/Library/Application Support/magpie/` | `~/.local/share/magpie/` |
//! | Config | `~/Library/Application Support/magpie/` | `~/.config/magpie/` |
//! | Cache | `~/Library/Caches/magpie/` | `~/.cache/magpie/` |
//!
//! # Environment Overrides
//!
//! All paths can be overridden for testing or custom deployments:
//! - `MAGPIE_DATA_DIR` — overrides [`data_dir`]
//! - `MAGPIE_CONFIG_DIR` — overrides [`config_dir`]
//! - `MAGPIE_CACHE_DIR` — overrides [`cache_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Used for persistent server data, most importantly the document store
/// database files.
///
/// Resolves to `dirs::data_dir()/magpie/` by default. Override with
/// the `MAGPIE_DATA_DIR` environment variable.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("MAGPIE_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("magpie"))
        .unwrap_or_else(|| PathBuf::from("/tmp/magpie-data"))
}

/// Application config directory.
///
/// Used for `config.toml` and other configuration files.
///
/// Resolves to `dirs::config_dir()/magpie/` by default. Override with
/// the `MAGPIE_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("MAGPIE_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("magpie"))
        .unwrap_or_else(|| PathBuf::from("/tmp/magpie-config"))
}

/// Application cache directory.
///
/// Used for expendable cached data.
///
/// Resolves to `dirs::cache_dir()/magpie/` by default. Override with
/// the `MAGPIE_CACHE_DIR` environment variable.
#[must_use]
pub fn cache_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("MAGPIE_CACHE_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::cache_dir()
        .map(|d| d.join("magpie"))
        .unwrap_or_else(|| PathBuf::from("/tmp/magpie-cache"))
}

/// Document store database directory (`data_dir()/stores/`).
///
/// Relative store paths in the config resolve against this directory.
#[must_use]
pub fn stores_dir() -> PathBuf {
    data_dir().join("stores")
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
