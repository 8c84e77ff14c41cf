//! Value extraction from datasource query results

use serde_json::Value;

use crate::config::MULTI_SERIES_LEGEND;
use crate::error::{QueryError, SeriesDefect};
use crate::models::{LabelValue, MetricQuery, MetricSnapshot};
use crate::transport::dto::QueryResponse;

/// Turn one query result into (label, value) pairs, one per series.
///
/// Only the most recent sample of each series is kept. The datasource
/// returns samples most-recent-first, so that is the first element.
/// A series that cannot produce a value fails the whole extraction.
pub fn extract_values(response: &QueryResponse) -> Result<Vec<LabelValue>, QueryError> {
    if let Some(message) = response.error.as_deref().filter(|m| !m.is_empty()) {
        return Err(QueryError::UpstreamQuery(message.to_string()));
    }

    response
        .data
        .result
        .iter()
        .map(|series| {
            let label = &series.metric.label;
            let malformed = |defect: SeriesDefect| QueryError::MalformedSeries {
                label: label.clone(),
                defect,
            };

            let sample = series
                .values
                .first()
                .ok_or_else(|| malformed(SeriesDefect::NoSamples))?;

            match sample.as_slice() {
                [_timestamp, Value::String(value)] => Ok(LabelValue {
                    label: label.clone(),
                    value: value.clone(),
                }),
                [_timestamp, _] => Err(malformed(SeriesDefect::NonStringValue)),
                _ => Err(malformed(SeriesDefect::NotAPair)),
            }
        })
        .collect()
}

/// Apply a query's legend template to its extracted values.
///
/// The multi-series sentinel keeps the datasource label of each series;
/// any other template replaces every label with the template itself.
pub fn apply_legend(values: &mut [LabelValue], legend: &str) {
    if legend == MULTI_SERIES_LEGEND {
        return;
    }
    for value in values {
        value.label = legend.to_string();
    }
}

/// Build the snapshot of one query from its raw result
pub fn snapshot(query: &MetricQuery, response: &QueryResponse) -> Result<MetricSnapshot, QueryError> {
    let mut values = extract_values(response)?;
    apply_legend(&mut values, &query.legend);

    Ok(MetricSnapshot {
        query: query.query.clone(),
        values,
    })
}
