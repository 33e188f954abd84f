//! Admin endpoints: editable settings and the document-store list.
//!
//! Every mutation follows the same path: clone the current config, apply
//! the change, validate, persist atomically, then rebuild the runtime so
//! new credentials and stores take effect without a restart.

use std::path::PathBuf;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{AppState, Runtime};
use crate::config::{AppConfig, StoreConfig};
use crate::error::Result;

pub(crate) async fn get_settings(State(state): State<AppState>) -> Json<Value> {
    let rt = state.runtime();
    let config = &rt.config;
    Json(json!({
        "per_page": config.server.per_page,
        "search_api_key": config.search.api_key,
        "search_engine_id": config.search.engine_id,
        "answer_api_key": config.panels.answer.api_key,
        "answer_base_url": config.panels.answer.base_url,
        "answer_model": config.panels.answer.model,
        "panels_enabled": config.panels.enabled,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SettingsUpdate {
    per_page: Option<usize>,
    search_api_key: Option<String>,
    search_engine_id: Option<String>,
    answer_api_key: Option<String>,
    answer_base_url: Option<String>,
    answer_model: Option<String>,
    panels_enabled: Option<bool>,
}

/// Partial settings update. Text fields are only applied when non-empty,
/// so a form submitted with blank credential boxes leaves the stored
/// credentials alone.
pub(crate) async fn update_settings(
    State(state): State<AppState>,
    body: Option<Json<SettingsUpdate>>,
) -> Json<Value> {
    let update = body.map(|Json(b)| b).unwrap_or_default();
    let mut config = state.runtime().config;

    if let Some(per_page) = update.per_page {
        config.server.per_page = per_page;
    }
    apply_text(&mut config.search.api_key, update.search_api_key);
    apply_text(&mut config.search.engine_id, update.search_engine_id);
    apply_text(&mut config.panels.answer.api_key, update.answer_api_key);
    apply_text(&mut config.panels.answer.base_url, update.answer_base_url);
    apply_text(&mut config.panels.answer.model, update.answer_model);
    if let Some(enabled) = update.panels_enabled {
        config.panels.enabled = enabled;
    }

    finish(&state, config, "settings updated")
}

fn apply_text(slot: &mut String, value: Option<String>) {
    if let Some(value) = value {
        let value = value.trim();
        if !value.is_empty() {
            *slot = value.to_owned();
        }
    }
}

pub(crate) async fn list_stores(State(state): State<AppState>) -> Json<Value> {
    let rt = state.runtime();
    let stores: Vec<Value> = rt
        .config
        .stores
        .iter()
        .map(|s| json!({ "name": s.name, "path": s.path, "enabled": s.enabled }))
        .collect();
    Json(json!({ "stores": stores }))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NewStore {
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    enabled: Option<bool>,
}

pub(crate) async fn add_store(
    State(state): State<AppState>,
    body: Option<Json<NewStore>>,
) -> Json<Value> {
    let store = body.map(|Json(b)| b).unwrap_or_default();
    let name = store.name.trim();
    let path = store.path.trim();
    if name.is_empty() || path.is_empty() {
        return Json(json!({ "success": false, "message": "name and path are required" }));
    }

    let mut config = state.runtime().config;
    config.stores.push(StoreConfig {
        name: name.to_owned(),
        path: PathBuf::from(path),
        enabled: store.enabled.unwrap_or(true),
    });
    finish(&state, config, "store added")
}

pub(crate) async fn remove_store(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Json<Value> {
    let mut config = state.runtime().config;
    if index >= config.stores.len() {
        return Json(json!({ "success": false, "message": "index out of range" }));
    }
    let removed = config.stores.remove(index);
    info!(name = %removed.name, "removing store");
    finish(&state, config, "store removed")
}

/// Validate, persist and swap in a rebuilt runtime.
fn finish(state: &AppState, config: AppConfig, action: &str) -> Json<Value> {
    match persist_and_rebuild(state, config) {
        Ok(()) => {
            info!("{action}");
            Json(json!({ "success": true }))
        }
        Err(e) => {
            warn!(error = %e, "{action} failed");
            Json(json!({ "success": false, "message": e.to_string() }))
        }
    }
}

fn persist_and_rebuild(state: &AppState, config: AppConfig) -> Result<()> {
    config.validate()?;
    config.save_to_file(state.config_path())?;
    let runtime = Runtime::from_config(config)?;
    state.replace(runtime);
    Ok(())
}
