//! Wire records returned by the Grafana API and the Prometheus datasource proxy

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Panel type of layout rows
pub const ROW_PANEL_TYPE: &str = "row";

/// Response of `GET /api/dashboards/uid/{uid}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub dashboard: DashboardBody,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardBody {
    pub id: i64,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub panels: Vec<PanelRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub alert: Option<AlertRecord>,
    #[serde(default)]
    pub targets: Vec<TargetRecord>,
    /// Children of a collapsed row
    #[serde(default)]
    pub panels: Vec<PanelRecord>,
}

impl PanelRecord {
    pub fn is_row(&self) -> bool {
        self.kind == ROW_PANEL_TYPE
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<ConditionRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionRecord {
    #[serde(default)]
    pub evaluator: EvaluatorRecord,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluatorRecord {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub params: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetRecord {
    #[serde(default)]
    pub expr: String,
    #[serde(rename = "legendFormat", default)]
    pub legend_format: String,
}

/// One entry of `GET /api/alerts`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStateRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub dashboard_id: i64,
    #[serde(default)]
    pub dashboard_uid: String,
    pub panel_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub new_state_date: String,
}

/// Response of the datasource `query_range` proxy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: QueryData,
    /// Set by the datasource when the query itself failed
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryData {
    #[serde(rename = "resultType", default)]
    pub result_type: String,
    #[serde(default)]
    pub result: Vec<SeriesRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesRecord {
    #[serde(default)]
    pub metric: SeriesMetric,
    /// `[timestamp, "value"]` samples, most recent first
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesMetric {
    #[serde(rename = "__name__", default)]
    pub name: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub label: String,
}
