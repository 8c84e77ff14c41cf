//! Scripted in-memory transport shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use panel_aggregator::config::{parse_base_url, ImageAttributes};
use panel_aggregator::engine::Aggregator;
use panel_aggregator::error::TransportError;
use panel_aggregator::transport::dto::{
    AlertRecord, AlertStateRecord, ConditionRecord, DashboardBody, DashboardResponse,
    EvaluatorRecord, PanelRecord, QueryData, QueryResponse, SeriesMetric, SeriesRecord,
    TargetRecord,
};
use panel_aggregator::transport::Transport;

pub const BASE_URL: &str = "http://grafana.test:3000";

/// Transport answering from fixed fixtures
#[derive(Default)]
pub struct FakeTransport {
    pub dashboard: DashboardResponse,
    pub dashboard_status: Option<u16>,
    pub alerts: Vec<AlertStateRecord>,
    pub alerts_status: Option<u16>,
    /// Outcome per query expression; unknown queries answer 404
    pub queries: HashMap<String, Result<QueryResponse, u16>>,
    /// Delay applied to every metric fetch
    pub query_delay: Option<Duration>,
    pub picture: Bytes,
    pub calls: Mutex<Vec<String>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub completed_queries: AtomicUsize,
}

impl FakeTransport {
    pub fn new(dashboard: DashboardResponse) -> Self {
        Self {
            dashboard,
            ..Default::default()
        }
    }

    pub fn with_alerts(mut self, alerts: Vec<AlertStateRecord>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn with_query(mut self, query: &str, response: QueryResponse) -> Self {
        self.queries.insert(query.to_string(), Ok(response));
        self
    }

    pub fn with_failing_query(mut self, query: &str, status: u16) -> Self {
        self.queries.insert(query.to_string(), Err(status));
        self
    }

    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

fn status(url: &str, status: u16) -> TransportError {
    TransportError::Status {
        url: url.to_string(),
        status,
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch_dashboard(&self, uid: &str) -> Result<DashboardResponse, TransportError> {
        self.record(format!("dashboard:{uid}"));
        match self.dashboard_status {
            Some(code) => Err(status("/api/dashboards/uid", code)),
            None => Ok(self.dashboard.clone()),
        }
    }

    async fn fetch_alert_states(
        &self,
        dashboard_id: i64,
    ) -> Result<Vec<AlertStateRecord>, TransportError> {
        self.record(format!("alerts:{dashboard_id}"));
        match self.alerts_status {
            Some(code) => Err(status("/api/alerts", code)),
            None => Ok(self.alerts.clone()),
        }
    }

    async fn fetch_metric_snapshot(&self, query: &str) -> Result<QueryResponse, TransportError> {
        self.record(format!("query:{query}"));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.query_delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed_queries.fetch_add(1, Ordering::SeqCst);

        match self.queries.get(query) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(code)) => Err(status("/api/datasources/proxy", *code)),
            None => Err(status("/api/datasources/proxy", 404)),
        }
    }

    async fn fetch_picture(&self, url: &str) -> Result<Bytes, TransportError> {
        self.record(format!("picture:{url}"));
        Ok(self.picture.clone())
    }
}

pub fn aggregator(transport: Arc<FakeTransport>) -> Aggregator {
    Aggregator::new(
        transport,
        parse_base_url(BASE_URL).unwrap(),
        ImageAttributes::default(),
    )
}

pub fn dashboard(id: i64, panels: Vec<PanelRecord>) -> DashboardResponse {
    DashboardResponse {
        dashboard: DashboardBody {
            id,
            uid: "uid-1".to_string(),
            panels,
        },
    }
}

/// A graph panel with `(expr, legend)` targets
pub fn panel(id: i64, title: &str, targets: &[(&str, &str)]) -> PanelRecord {
    PanelRecord {
        id,
        title: title.to_string(),
        kind: "graph".to_string(),
        targets: targets
            .iter()
            .map(|(expr, legend)| TargetRecord {
                expr: expr.to_string(),
                legend_format: legend.to_string(),
            })
            .collect(),
        ..Default::default()
    }
}

pub fn row(id: i64, title: &str) -> PanelRecord {
    PanelRecord {
        id,
        title: title.to_string(),
        kind: "row".to_string(),
        ..Default::default()
    }
}

pub fn with_alert(mut panel: PanelRecord, name: &str, kind: &str, params: &[f64]) -> PanelRecord {
    panel.alert = Some(AlertRecord {
        name: name.to_string(),
        conditions: vec![ConditionRecord {
            evaluator: EvaluatorRecord {
                kind: kind.to_string(),
                params: params.to_vec(),
            },
        }],
    });
    panel
}

pub fn alert_state(panel_id: i64, name: &str, state: &str) -> AlertStateRecord {
    AlertStateRecord {
        panel_id,
        name: name.to_string(),
        state: state.to_string(),
        ..Default::default()
    }
}

/// A successful query result with one `(label, value)` series each
pub fn series(points: &[(&str, &str)]) -> QueryResponse {
    QueryResponse {
        status: "success".to_string(),
        data: QueryData {
            result_type: "matrix".to_string(),
            result: points
                .iter()
                .map(|(label, value)| SeriesRecord {
                    metric: SeriesMetric {
                        label: label.to_string(),
                        ..Default::default()
                    },
                    values: vec![vec![json!(1_700_000_000), json!(value)]],
                })
                .collect(),
        },
        error: None,
    }
}

pub fn upstream_error(message: &str) -> QueryResponse {
    QueryResponse {
        status: "error".to_string(),
        error: Some(message.to_string()),
        ..Default::default()
    }
}
