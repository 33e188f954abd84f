//! The `/api/search` handler.
//!
//! Turns request parameters into a [`QueryContext`], runs the retrieval
//! pipeline, and assembles the response: the ranked page, category list,
//! related terms, and panels. Panels and related terms are fetched
//! concurrently with the search itself.

use axum::extract::{Query, State};
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::HeaderMap;
use axum::Json;
use magpie_search::{run_search, ExternalSource, QueryContext, RankedResult, SENTINEL_QUERY};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::panels::Panels;
use crate::store::{consolidate_types, expand_type_filter};
use crate::text::preprocess_query;

/// Languages the UI offers, mapped from `Accept-Language` primary tags.
const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "en-US"),
    ("de", "de-DE"),
    ("fr", "fr-FR"),
    ("es", "es-ES"),
    ("it", "it-IT"),
];
const DEFAULT_LANGUAGE: &str = "en-US";

#[derive(Debug, Deserialize)]
pub(crate) struct SearchParams {
    q: Option<String>,
    #[serde(rename = "type")]
    doc_type: Option<String>,
    lang: Option<String>,
    page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchResponse {
    pub results: Vec<RankedResult>,
    pub total_results: usize,
    pub page: usize,
    pub per_page: usize,
    pub took_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The preprocessed query the stores actually matched.
    pub query: String,
    /// The query exactly as submitted, for the search box.
    pub original_query: String,
    pub categories: Vec<String>,
    pub related_terms: Vec<String>,
    pub panels: Panels,
}

pub(crate) async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let rt = state.runtime();

    let original_query = params.q.unwrap_or_default().trim().to_owned();
    let processed_query = preprocess_query(&original_query);

    let selected_type = params.doc_type.unwrap_or_default().trim().to_owned();
    let type_filter = if selected_type.is_empty() {
        Vec::new()
    } else {
        expand_type_filter(&rt.config.types.synonyms, &selected_type)
    };

    // An absent lang falls back to the browser's preferred language; an
    // explicitly empty lang disables the filter.
    let lang_filter = match params.lang {
        Some(lang) => {
            let lang = lang.trim().to_owned();
            (!lang.is_empty()).then_some(lang)
        }
        None => Some(default_language(&headers)),
    };

    let ctx = QueryContext {
        raw_query: original_query.clone(),
        query: processed_query,
        type_filter,
        lang_filter,
        page: params.page.unwrap_or(1).max(1),
        per_page: rt.config.server.per_page,
    };

    let sources = rt.registry.sources();
    let external = rt.external.as_deref().map(|c| c as &dyn ExternalSource);

    let related_terms = async {
        if original_query.is_empty() || original_query == SENTINEL_QUERY {
            Vec::new()
        } else {
            rt.answer.related_terms(&original_query).await
        }
    };

    let (outcome, related_terms, panels) = tokio::join!(
        run_search(&ctx, &sources, external),
        related_terms,
        rt.panels.lookup_all(&original_query, ctx.lang_filter.as_deref()),
    );

    let categories = consolidate_types(&rt.config.types.synonyms, rt.registry.distinct_types());

    Json(SearchResponse {
        results: outcome.results,
        total_results: outcome.total_results,
        page: outcome.page,
        per_page: outcome.per_page,
        took_ms: outcome.took_ms,
        message: outcome.message,
        query: ctx.query,
        original_query,
        categories,
        related_terms,
        panels,
    })
}

/// Best supported language from the `Accept-Language` header, as a full
/// locale code. Unknown or missing languages fall back to English.
fn default_language(headers: &HeaderMap) -> String {
    let header = headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    best_language_match(header)
}

fn best_language_match(header: &str) -> String {
    let mut best: Option<(&'static str, f32)> = None;
    for part in header.split(',') {
        let mut pieces = part.trim().splitn(2, ';');
        let tag = pieces.next().unwrap_or("").trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        let quality = pieces
            .next()
            .and_then(|q| q.trim().strip_prefix("q="))
            .and_then(|q| q.parse::<f32>().ok())
            .unwrap_or(1.0);
        let primary = tag.split('-').next().unwrap_or(tag.as_str());
        if let Some((_, full)) = SUPPORTED_LANGUAGES.iter().find(|(p, _)| *p == primary) {
            if best.map_or(true, |(_, q)| quality > q) {
                best = Some((full, quality));
            }
        }
    }
    best.map_or_else(|| DEFAULT_LANGUAGE.to_owned(), |(full, _)| full.to_owned())
}
