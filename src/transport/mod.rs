//! Upstream transport contract and its Grafana implementation

pub mod dto;
pub mod grafana;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;
use dto::{AlertStateRecord, DashboardResponse, QueryResponse};

pub use grafana::GrafanaClient;

/// Authenticated access to dashboard structure, alert state and live metric values.
///
/// Implementations must be safe to share across concurrently running fetch tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch one dashboard by its uid
    async fn fetch_dashboard(&self, uid: &str) -> Result<DashboardResponse, TransportError>;

    /// Fetch the alert states of every alert declared on a dashboard
    async fn fetch_alert_states(
        &self,
        dashboard_id: i64,
    ) -> Result<Vec<AlertStateRecord>, TransportError>;

    /// Run one metric query over an instant window ending now
    async fn fetch_metric_snapshot(&self, query: &str) -> Result<QueryResponse, TransportError>;

    /// Download a rendered panel image
    async fn fetch_picture(&self, url: &str) -> Result<Bytes, TransportError>;
}
