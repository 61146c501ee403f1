use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::TenderSource;
use crate::config::Config;
use crate::services::TenderCache;
use crate::state::SharedState;

mod error;
mod observability;
mod system;
mod tenders;
mod types;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn tenders(&self) -> &Arc<TenderCache> {
        &self.shared.tenders
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config)?);
    Ok(create_app_state(shared, prometheus_handle))
}

/// App state backed by a caller-supplied tender source instead of the HTTP scraper.
#[must_use]
pub fn create_app_state_with_source(
    config: Config,
    source: Arc<dyn TenderSource>,
) -> Arc<AppState> {
    let shared = Arc::new(SharedState::with_source(config, source));
    create_app_state(shared, None)
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = &state.config().server.cors_allowed_origins;

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route(
            "/api/tenders",
            post(tenders::get_tenders).get(tenders::list_tenders),
        )
        .route("/api/tenders/summary", get(tenders::get_summary))
        .route("/health", get(system::health))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
