//! Panel resolution from a raw dashboard response

use crate::models::{Alert, Condition, DashboardSnapshot, MetricQuery, PanelDefinition};
use crate::transport::dto::{DashboardResponse, PanelRecord};

/// Normalize a dashboard into its non-layout panels, in source order.
///
/// Row panels are dropped. Children of collapsed rows are resolved in the
/// position of their row. Duplicate panel ids are not checked.
pub fn resolve_panels(response: &DashboardResponse) -> DashboardSnapshot {
    let mut panels = Vec::with_capacity(response.dashboard.panels.len());
    collect(&response.dashboard.panels, &mut panels);

    DashboardSnapshot {
        id: response.dashboard.id,
        panels,
    }
}

fn collect(records: &[PanelRecord], out: &mut Vec<PanelDefinition>) {
    for record in records {
        if record.is_row() {
            collect(&record.panels, out);
            continue;
        }
        out.push(definition(record));
    }
}

fn definition(record: &PanelRecord) -> PanelDefinition {
    let queries = record
        .targets
        .iter()
        .map(|target| MetricQuery {
            query: target.expr.clone(),
            legend: target.legend_format.clone(),
        })
        .collect();

    // State stays empty until joined with the live alert states
    let alert = record
        .alert
        .as_ref()
        .map(|alert| Alert {
            name: alert.name.clone(),
            state: String::new(),
            conditions: alert
                .conditions
                .iter()
                .map(|c| Condition {
                    kind: c.evaluator.kind.clone(),
                    values: c.evaluator.params.clone(),
                })
                .collect(),
        })
        .unwrap_or_default();

    PanelDefinition {
        id: record.id,
        title: record.title.clone(),
        alert,
        queries,
    }
}
