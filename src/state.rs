//! Application state shared across handlers

use crate::engine::Aggregator;
use crate::routes::metrics::Metrics;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Panel aggregation engine
    pub aggregator: Arc<Aggregator>,
    /// Application metrics for Prometheus
    pub metrics: Arc<Metrics>,
    /// Upper bound for one request-triggered aggregation
    pub request_timeout: Duration,
}

impl AppState {
    /// Create new application state
    ///
    /// # Arguments
    /// * `aggregator` - Engine serving every request
    /// * `request_timeout` - Deadline after which in-flight fetches are dropped
    pub fn new(aggregator: Aggregator, request_timeout: Duration) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            metrics: Arc::new(Metrics::new()),
            request_timeout,
        }
    }
}
