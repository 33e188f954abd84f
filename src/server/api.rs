//! Small JSON endpoints: category listing, favicon lookup, suggestions,
//! query preprocessing and the page-content helpers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use magpie_search::content::{extract_content_with_limit, fetch_html, summarize};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{AppState, Runtime};
use crate::error::Result;
use crate::store::consolidate_types;
use crate::text::preprocess_query;

const SUGGESTION_LIMIT: usize = 5;
const AUTOCOMPLETE_LIMIT: usize = 10;
/// Extracted page text is clipped to this many characters for display.
const CONTENT_DISPLAY_LIMIT: usize = 10_000;

pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn types(State(state): State<AppState>) -> Json<Value> {
    let rt = state.runtime();
    let types = consolidate_types(&rt.config.types.synonyms, rt.registry.distinct_types());
    Json(json!({ "types": types }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct FaviconParams {
    url: Option<String>,
}

pub(crate) async fn favicon(
    State(state): State<AppState>,
    Query(params): Query<FaviconParams>,
) -> (StatusCode, Json<Value>) {
    let url = params.url.unwrap_or_default();
    if url.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "favicon": null })));
    }
    let rt = state.runtime();
    let icon = rt.favicons.resolve(url.trim()).await;
    (StatusCode::OK, Json(json!({ "favicon": icon })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SuggestBody {
    #[serde(default)]
    query: String,
}

/// Title substring matches for the search-as-you-type dropdown. A missing
/// or malformed body is treated as an empty term, which matches the most
/// liked documents overall.
pub(crate) async fn suggest(
    State(state): State<AppState>,
    body: Option<Json<SuggestBody>>,
) -> Json<Value> {
    let term = body.map(|Json(b)| b.query).unwrap_or_default();
    let rt = state.runtime();
    let suggestions: Vec<Value> = rt
        .registry
        .suggest(term.trim(), SUGGESTION_LIMIT)
        .into_iter()
        .map(|(title, url)| json!({ "title": title, "url": url }))
        .collect();
    Json(json!({ "suggestions": suggestions }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TermParams {
    term: Option<String>,
}

pub(crate) async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<TermParams>,
) -> Json<Vec<String>> {
    let term = params.term.unwrap_or_default();
    let term = term.trim();
    if term.is_empty() {
        return Json(Vec::new());
    }
    let rt = state.runtime();
    Json(rt.registry.autocomplete(term, AUTOCOMPLETE_LIMIT))
}

pub(crate) async fn single_result(
    State(state): State<AppState>,
    Query(params): Query<TermParams>,
) -> Json<Value> {
    let term = params.term.unwrap_or_default();
    let rt = state.runtime();
    match rt.registry.single_result_url(term.trim()) {
        Some(url) => Json(json!({ "has_single_result": true, "single_result_url": url })),
        None => Json(json!({ "has_single_result": false })),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreprocessParams {
    query: Option<String>,
}

pub(crate) async fn preprocess(Query(params): Query<PreprocessParams>) -> Json<Value> {
    let original = params.query.unwrap_or_default();
    Json(json!({
        "original_query": original,
        "processed_query": preprocess_query(&original),
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryParams {
    url: Option<String>,
}

/// Fetch a page and return a short summary plus its favicon. The extractive
/// summary is handed to the answer model for condensation when one is
/// configured; on any model failure the extractive text stands.
pub(crate) async fn summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> (StatusCode, Json<Value>) {
    let url = params.url.unwrap_or_default();
    let url = url.trim();
    if url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "url parameter is required" })),
        );
    }
    let rt = state.runtime();
    match page_summary(&rt, url).await {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(e) => {
            warn!(%url, error = %e, "page summary failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
        }
    }
}

async fn page_summary(rt: &Runtime, url: &str) -> Result<Value> {
    let html = fetch_html(&rt.http, url).await?;
    let page = summarize(&html);
    let title = page.title.as_deref().unwrap_or_default();
    let summary = match rt.answer.condense(title, &page.summary).await {
        Ok(Some(condensed)) => condensed,
        Ok(None) => page.summary,
        Err(e) => {
            debug!(error = %e, "summary condensation failed");
            page.summary
        }
    };
    let favicon = rt.favicons.resolve(url).await;
    Ok(json!({
        "success": true,
        "title": page.title,
        "summary": summary,
        "favicon": favicon,
        "url": url,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageContentBody {
    url: Option<String>,
}

/// Fetch a page and return its readable text, clipped for display. Failures
/// come back in the success envelope rather than as HTTP errors so the UI
/// can show them inline.
pub(crate) async fn page_content(
    State(state): State<AppState>,
    body: Option<Json<PageContentBody>>,
) -> Json<Value> {
    let url = body.and_then(|Json(b)| b.url).unwrap_or_default();
    let url = url.trim();
    if url.is_empty() {
        return Json(json!({ "success": false, "error": "no url given" }));
    }
    let rt = state.runtime();
    match extract_page(&rt, url).await {
        Ok(text) => Json(json!({ "success": true, "extracted_content": text })),
        Err(e) => {
            warn!(%url, error = %e, "content extraction failed");
            Json(json!({ "success": false, "error": e.to_string() }))
        }
    }
}

async fn extract_page(rt: &Runtime, url: &str) -> Result<String> {
    let html = fetch_html(&rt.http, url).await?;
    let content = extract_content_with_limit(&html, CONTENT_DISPLAY_LIMIT)?;
    Ok(content.text)
}
