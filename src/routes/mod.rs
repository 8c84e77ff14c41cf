//! HTTP routes

pub mod health;
pub mod metrics;
pub mod panels;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health and metrics (Kubernetes probes + Prometheus)
        .route("/health", get(health::health))
        .route("/metrics", get(metrics::prometheus_metrics))
        // Aggregated panels
        .route("/api/v1/dashboards/:uid/panels", get(panels::list_panels))
        .route("/api/v1/dashboards/:uid/panels/:title", get(panels::get_panel))
        .route(
            "/api/v1/dashboards/:uid/panels/:title/picture",
            get(panels::get_panel_picture),
        )
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
