//! Magpie: self-hosted meta-search backend.
//!
//! A search runs against every configured local document store and, for
//! text queries, an external web-search API in parallel:
//! Query → preprocessing → stores + web search → merge/rank → page
//!
//! # Architecture
//!
//! - **Stores**: SQLite FTS5 document databases opened from config
//! - **Pipeline**: retrieval, scoring and interleaving (the `magpie-search`
//!   crate, shared with embedding hosts)
//! - **Panels**: knowledge, code, crypto, weather, Q&A and answer-model
//!   enrichment alongside the result list
//! - **Server**: the axum JSON API, including the admin surface
//!
//! The `magpie-server` binary wires these together from a TOML config.

pub mod config;
pub mod error;
pub mod magpie_dirs;
pub mod panels;
pub mod server;
pub mod store;
pub mod text;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use server::{ApiServer, AppState};
pub use store::{DocumentStore, StoreRegistry};
