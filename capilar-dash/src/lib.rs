//! capilar-dash library - catalog review and correction service
//!
//! Serves the dashboard UI and a JSON API over a single [`Dashboard`].
//! Every request locks the dashboard, so intents are applied strictly one
//! after another.

use std::sync::Arc;

use axum::Router;
use capilar_common::{Dashboard, KeyValueStore};
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod pagination;

/// Overlay backend chosen at startup (file store, or memory when ephemeral)
pub type SharedStore = Box<dyn KeyValueStore + Send>;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Mutex<Dashboard<SharedStore>>>,
}

impl AppState {
    pub fn new(dashboard: Dashboard<SharedStore>) -> Self {
        Self {
            dashboard: Arc::new(Mutex::new(dashboard)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let api = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/state", get(api::get_state))
        .route("/api/intents", post(api::post_intent))
        .route("/api/products", get(api::list_products))
        .route("/api/brands", get(api::list_brands))
        .route("/api/domains", get(api::list_domains))
        .route("/api/detail", get(api::get_detail))
        .route("/api/tracking", get(api::list_tracking))
        .route("/api/export", get(api::export_snapshot));

    let ui = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .merge(api::health_routes());

    Router::new()
        .merge(api)
        .merge(ui)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
