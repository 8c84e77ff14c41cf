//! Prometheus metrics endpoint

use axum::{extract::State, response::IntoResponse};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::state::AppState;

/// Application metrics for Prometheus
#[derive(Default)]
pub struct Metrics {
    /// Total aggregation calls
    pub aggregations_total: AtomicU64,
    /// Aggregation calls that returned an error
    pub aggregation_failures_total: AtomicU64,
    /// Total panels returned to clients
    pub panels_served_total: AtomicU64,
    /// Total panel pictures proxied
    pub pictures_served_total: AtomicU64,
    /// Picture requests that returned an error
    pub picture_failures_total: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_aggregations(&self) {
        self.aggregations_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failures(&self) {
        self.aggregation_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_panels(&self, count: u64) {
        self.panels_served_total.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_pictures(&self) {
        self.pictures_served_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_picture_failures(&self) {
        self.picture_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            aggregations_total: self.aggregations_total.load(Ordering::Relaxed),
            aggregation_failures_total: self.aggregation_failures_total.load(Ordering::Relaxed),
            panels_served_total: self.panels_served_total.load(Ordering::Relaxed),
            pictures_served_total: self.pictures_served_total.load(Ordering::Relaxed),
            picture_failures_total: self.picture_failures_total.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub aggregations_total: u64,
    pub aggregation_failures_total: u64,
    pub panels_served_total: u64,
    pub pictures_served_total: u64,
    pub picture_failures_total: u64,
}

/// GET /metrics
///
/// Returns Prometheus-format metrics
pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.metrics.get_metrics();

    let output = format!(
        r#"# HELP panel_aggregator_aggregations_total Total number of dashboard aggregations
# TYPE panel_aggregator_aggregations_total counter
panel_aggregator_aggregations_total {}

# HELP panel_aggregator_aggregation_failures_total Total number of failed dashboard aggregations
# TYPE panel_aggregator_aggregation_failures_total counter
panel_aggregator_aggregation_failures_total {}

# HELP panel_aggregator_panels_served_total Total number of aggregated panels returned
# TYPE panel_aggregator_panels_served_total counter
panel_aggregator_panels_served_total {}

# HELP panel_aggregator_pictures_served_total Total number of panel pictures proxied
# TYPE panel_aggregator_pictures_served_total counter
panel_aggregator_pictures_served_total {}

# HELP panel_aggregator_picture_failures_total Total number of failed panel picture requests
# TYPE panel_aggregator_picture_failures_total counter
panel_aggregator_picture_failures_total {}

# HELP panel_aggregator_info Build information
# TYPE panel_aggregator_info gauge
panel_aggregator_info{{version="{}"}} 1
"#,
        snapshot.aggregations_total,
        snapshot.aggregation_failures_total,
        snapshot.panels_served_total,
        snapshot.pictures_served_total,
        snapshot.picture_failures_total,
        env!("CARGO_PKG_VERSION"),
    );

    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = Metrics::new();
        metrics.inc_aggregations();
        metrics.inc_aggregations();
        metrics.inc_failures();
        metrics.inc_panels(3);
        metrics.inc_pictures();
        metrics.inc_picture_failures();

        assert_eq!(
            metrics.get_metrics(),
            MetricsSnapshot {
                aggregations_total: 2,
                aggregation_failures_total: 1,
                panels_served_total: 3,
                pictures_served_total: 1,
                picture_failures_total: 1,
            }
        );
    }
}
