//! Core domain models for panel aggregation

use serde::{Deserialize, Serialize};

/// One fetched dashboard's structure
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    /// Numeric dashboard id, used to look up alert states
    pub id: i64,
    /// Non-layout panels in source order
    pub panels: Vec<PanelDefinition>,
}

/// A single non-layout panel as declared on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct PanelDefinition {
    /// Panel id, unique within its dashboard
    pub id: i64,
    pub title: String,
    /// Declared alert rule; state is empty until joined with live alert state
    pub alert: Alert,
    pub queries: Vec<MetricQuery>,
}

/// One query expression bound to a legend template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub query: String,
    pub legend: String,
}

/// Alert rule of a panel together with its live state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub name: String,
    /// Live evaluation result ("ok", "alerting", ...). Empty when unknown.
    pub state: String,
    pub conditions: Vec<Condition>,
}

impl Alert {
    /// Whether a live state was joined into this alert
    pub fn has_state(&self) -> bool {
        !self.state.is_empty()
    }
}

/// A single threshold condition of an alert rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Evaluator type: "gt", "lt", "within_range", ...
    #[serde(rename = "type")]
    pub kind: String,
    pub values: Vec<f64>,
}

/// Live state of one panel's alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertState {
    pub panel_id: i64,
    pub name: String,
    pub state: String,
}

/// Live values for one metric query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub query: String,
    pub values: Vec<LabelValue>,
}

/// One (series label, value) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelValue {
    pub label: String,
    /// Numeric value as reported by the datasource, kept as text
    pub value: String,
}

/// Final joined view of one panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPanel {
    pub title: String,
    /// Rendered image URL
    pub image: String,
    pub alert: Alert,
    #[serde(rename = "current_values")]
    pub metrics: Vec<MetricSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregated_panel_json_shape() {
        let panel = AggregatedPanel {
            title: "CPU".to_string(),
            image: "http://grafana/render".to_string(),
            alert: Alert {
                name: "HighCPU".to_string(),
                state: "alerting".to_string(),
                conditions: vec![Condition {
                    kind: "gt".to_string(),
                    values: vec![80.0],
                }],
            },
            metrics: vec![MetricSnapshot {
                query: "cpu_pct{}".to_string(),
                values: vec![LabelValue {
                    label: "node-a".to_string(),
                    value: "42".to_string(),
                }],
            }],
        };

        let json = serde_json::to_value(&panel).unwrap();
        assert_eq!(json["alert"]["conditions"][0]["type"], "gt");
        assert_eq!(json["current_values"][0]["values"][0]["label"], "node-a");
        assert!(json.get("metrics").is_none());
    }

    #[test]
    fn test_alert_has_state() {
        let mut alert = Alert::default();
        assert!(!alert.has_state());

        alert.state = "ok".to_string();
        assert!(alert.has_state());
    }
}
