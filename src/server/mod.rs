//! HTTP API server.
//!
//! Serves the search endpoint, the small query-support endpoints
//! (suggestions, autocompletion, preprocessing, favicons, page
//! summaries), and the admin settings/stores surface.
//!
//! Sub-modules:
//! - `search`: the `/api/search` handler and response assembly.
//! - `api`: health, types, favicon, suggest, autocomplete, preprocess,
//!   summary, and page-content handlers.
//! - `admin`: settings and store management handlers.

pub mod admin;
pub mod api;
pub mod search;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use axum::routing::{delete, get, post};
use axum::Router;
use magpie_search::{FaviconResolver, WebSearchClient};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::panels::{AnswerClient, PanelSet};
use crate::store::StoreRegistry;

/// Everything the handlers work with, rebuilt wholesale when the admin
/// settings change. Cheap to clone; the registry, clients, and panel set
/// are shared behind `Arc`s.
#[derive(Clone)]
pub(crate) struct Runtime {
    pub(crate) config: AppConfig,
    pub(crate) registry: Arc<StoreRegistry>,
    pub(crate) external: Option<Arc<WebSearchClient>>,
    pub(crate) panels: Arc<PanelSet>,
    pub(crate) answer: Arc<AnswerClient>,
    pub(crate) favicons: Arc<FaviconResolver>,
    pub(crate) http: reqwest::Client,
}

impl Runtime {
    /// Build the full runtime from a config: shared HTTP client, store
    /// registry, external search client (when credentials are present),
    /// panel clients, and favicon resolver.
    pub(crate) fn from_config(config: AppConfig) -> crate::error::Result<Self> {
        let search_config = config.search_config();
        let http = magpie_search::http::build_client(&search_config)?;
        let registry = Arc::new(StoreRegistry::open(&config.stores));

        let external = if config.search.api_key.is_empty() || config.search.engine_id.is_empty() {
            None
        } else {
            Some(Arc::new(WebSearchClient::new(
                &search_config,
                config.search.api_key.clone(),
                config.search.engine_id.clone(),
            )?))
        };

        let answer = Arc::new(AnswerClient::new(http.clone(), &config.panels.answer));
        let panels = Arc::new(PanelSet::new(&config.panels, &http, Arc::clone(&answer)));
        let favicons = Arc::new(FaviconResolver::new(http.clone(), &search_config));

        Ok(Self {
            config,
            registry,
            external,
            panels,
            answer,
            favicons,
            http,
        })
    }
}

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    config_path: PathBuf,
    inner: Arc<RwLock<Runtime>>,
}

impl AppState {
    /// Build the state from a loaded config. `config_path` is where the
    /// admin endpoints persist changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be built.
    pub fn new(config: AppConfig, config_path: PathBuf) -> crate::error::Result<Self> {
        let runtime = Runtime::from_config(config)?;
        Ok(Self {
            config_path,
            inner: Arc::new(RwLock::new(runtime)),
        })
    }

    /// Snapshot of the current runtime. Handlers take a snapshot once and
    /// work from it so admin swaps never tear a request in half.
    pub(crate) fn runtime(&self) -> Runtime {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the runtime after a config change.
    pub(crate) fn replace(&self, runtime: Runtime) {
        match self.inner.write() {
            Ok(mut guard) => *guard = runtime,
            Err(poisoned) => *poisoned.into_inner() = runtime,
        }
    }

    pub(crate) fn config_path(&self) -> &std::path::Path {
        &self.config_path
    }
}

/// Assemble the application router.
fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/search", get(search::search))
        .route("/api/types", get(api::types))
        .route("/api/favicon", get(api::favicon))
        .route("/api/suggest", post(api::suggest))
        .route("/api/autocomplete", get(api::autocomplete))
        .route("/api/single_result", get(api::single_result))
        .route("/api/preprocess", get(api::preprocess))
        .route("/api/summary", get(api::summary))
        .route("/api/page_content", post(api::page_content))
        .route(
            "/api/admin/settings",
            get(admin::get_settings).post(admin::update_settings),
        )
        .route(
            "/api/admin/stores",
            get(admin::list_stores).post(admin::add_store),
        )
        .route("/api/admin/stores/{index}", delete(admin::remove_store))
        .with_state(state)
}

/// The HTTP API server, running in a background task.
pub struct ApiServer {
    /// The address the server is listening on.
    addr: SocketAddr,
    /// Handle to the background server task.
    handle: JoinHandle<()>,
}

impl ApiServer {
    /// Start the API server.
    ///
    /// Binds to `{host}:{port}` (use port `0` for auto-assign) and begins
    /// serving in a background tokio task.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(state: AppState, host: &str, port: u16) -> crate::error::Result<Self> {
        let app = router(state);

        let bind_addr = format!("{host}:{port}");
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| AppError::Server(format!("bind {bind_addr} failed: {e}")))?;

        let addr = listener
            .local_addr()
            .map_err(|e| AppError::Server(format!("failed to get local addr: {e}")))?;

        info!("api server listening on http://{addr}");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("api server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
