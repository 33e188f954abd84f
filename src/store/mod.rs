//! Self-hosted document stores.
//!
//! Sub-modules:
//! - `schema`: SQLite DDL, FTS5 index, and sync triggers.
//! - `sqlite`: SQLite-backed `DocumentStore`.
//! - `taxonomy`: document type consolidation and synonym expansion.

pub(crate) mod schema;
pub mod sqlite;
pub mod taxonomy;

pub use sqlite::{DocumentStore, NewDocument};
pub use taxonomy::{consolidate_types, expand_type_filter};

use std::collections::BTreeSet;
use std::sync::Arc;

use magpie_search::LocalSource;
use tracing::{info, warn};

use crate::config::StoreConfig;

/// All opened document stores, in configuration order.
///
/// A store that fails to open is logged and skipped so one broken database
/// file cannot take the whole service down; searches run against whatever
/// subset opened.
pub struct StoreRegistry {
    stores: Vec<Arc<DocumentStore>>,
}

impl StoreRegistry {
    /// Open every enabled store from the config.
    #[must_use]
    pub fn open(configs: &[StoreConfig]) -> Self {
        let mut stores = Vec::new();
        for cfg in configs.iter().filter(|c| c.enabled) {
            let path = cfg.resolved_path();
            match DocumentStore::open(&cfg.name, &path) {
                Ok(store) => {
                    info!(
                        store = %cfg.name,
                        path = %path.display(),
                        documents = store.document_count().unwrap_or(0),
                        "opened document store"
                    );
                    stores.push(Arc::new(store));
                }
                Err(e) => {
                    warn!(store = %cfg.name, path = %path.display(), error = %e, "skipping store");
                }
            }
        }
        Self { stores }
    }

    /// Registry over already-opened stores (used by tests).
    #[must_use]
    pub fn from_stores(stores: Vec<Arc<DocumentStore>>) -> Self {
        Self { stores }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    #[must_use]
    pub fn stores(&self) -> &[Arc<DocumentStore>] {
        &self.stores
    }

    /// The stores as query sources for the search pipeline.
    #[must_use]
    pub fn sources(&self) -> Vec<Arc<dyn LocalSource>> {
        self.stores
            .iter()
            .map(|s| Arc::clone(s) as Arc<dyn LocalSource>)
            .collect()
    }

    /// Distinct raw document types across all stores, sorted. Per-store
    /// read failures are logged and skipped.
    #[must_use]
    pub fn distinct_types(&self) -> Vec<String> {
        let mut set = BTreeSet::new();
        for store in &self.stores {
            match store.distinct_types() {
                Ok(types) => set.extend(types),
                Err(e) => {
                    warn!(store = %store.store_name(), error = %e, "failed to read document types");
                }
            }
        }
        set.into_iter().collect()
    }

    /// Title substring matches across all stores, first occurrence per URL,
    /// capped at `limit`.
    #[must_use]
    pub fn suggest(&self, term: &str, limit: usize) -> Vec<(String, String)> {
        let mut seen = BTreeSet::new();
        let mut merged = Vec::new();
        for store in &self.stores {
            match store.title_matches(term, limit) {
                Ok(matches) => {
                    for (title, url) in matches {
                        if merged.len() >= limit {
                            return merged;
                        }
                        if seen.insert(url.clone()) {
                            merged.push((title, url));
                        }
                    }
                }
                Err(e) => {
                    warn!(store = %store.store_name(), error = %e, "suggestion lookup failed");
                }
            }
        }
        merged
    }

    /// Distinct matching titles across all stores, capped at `limit`.
    #[must_use]
    pub fn autocomplete(&self, term: &str, limit: usize) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut titles = Vec::new();
        for store in &self.stores {
            match store.title_matches(term, limit) {
                Ok(matches) => {
                    for (title, _) in matches {
                        if titles.len() >= limit {
                            return titles;
                        }
                        if seen.insert(title.clone()) {
                            titles.push(title);
                        }
                    }
                }
                Err(e) => {
                    warn!(store = %store.store_name(), error = %e, "autocomplete lookup failed");
                }
            }
        }
        titles
    }

    /// The URL of the unique document titled exactly `term`, if there is
    /// exactly one such document across all stores.
    #[must_use]
    pub fn single_result_url(&self, term: &str) -> Option<String> {
        let mut found: Option<String> = None;
        for store in &self.stores {
            match store.exact_title_urls(term) {
                Ok(urls) => {
                    for url in urls {
                        if found.is_some() {
                            return None;
                        }
                        found = Some(url);
                    }
                }
                Err(e) => {
                    warn!(store = %store.store_name(), error = %e, "single-result lookup failed");
                }
            }
        }
        found
    }
}
