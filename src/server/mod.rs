//! Local HTTP endpoint over the layout engine and the threshold store.

mod routes;

pub use routes::{
    ApiError, GlobalRequest, GroupRequest, GroupResponse, HistogramRequest, HistogramsRequest,
    NodeRequest, ResolveRequest, SankeyRequest,
};

use crate::config::Config;
use crate::engine::LayoutEngine;
use crate::threshold::ThresholdStore;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across handlers. Each request holds a lock for
/// one synchronous computation.
pub struct AppState {
    pub config: Config,
    pub engine: Mutex<LayoutEngine>,
    pub thresholds: Mutex<ThresholdStore>,
    /// Node ids from the most recent Sankey request, for group lookups.
    pub known_node_ids: Mutex<Vec<String>>,
}

impl AppState {
    pub fn new(config: Config, thresholds: ThresholdStore) -> Self {
        Self {
            engine: Mutex::new(LayoutEngine::new(&config.cache)),
            thresholds: Mutex::new(thresholds),
            known_node_ids: Mutex::new(Vec::new()),
            config,
        }
    }
}

/// A panicked handler leaves plain data behind; keep serving it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::index_handler))
        .route("/api/layout/sankey", post(routes::sankey_handler))
        .route("/api/layout/histogram", post(routes::histogram_handler))
        .route("/api/layout/histograms", post(routes::histograms_handler))
        .route("/api/thresholds", get(routes::thresholds_handler))
        .route("/api/thresholds/resolve", post(routes::resolve_handler))
        .route("/api/thresholds/global", post(routes::global_handler))
        .route("/api/thresholds/node", post(routes::node_handler))
        .route("/api/thresholds/group", post(routes::group_handler))
        .route("/api/thresholds/reset", post(routes::reset_handler))
        .layer(cors)
        .with_state(state)
}

/// Bind to localhost and serve until the process is stopped.
pub async fn serve(
    state: AppState,
    port: u16,
    open_browser: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(Arc::new(state));

    let addr = format!("127.0.0.1:{}", port);
    let url = format!("http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "saeflow endpoint listening");
    println!("Serving saeflow layouts at {}", crate::style::url(&url));
    println!("Press Ctrl+C to stop");

    if open_browser {
        if let Err(e) = open::that(&url) {
            crate::style::warning(&format!("Could not open browser: {}", e));
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
