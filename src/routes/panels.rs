//! Aggregated panel API endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::models::AggregatedPanel;
use crate::state::AppState;

/// Query parameters for the panel list endpoint
#[derive(Debug, Deserialize)]
pub struct PanelsQuery {
    /// Comma-separated panel titles to restrict the result to
    pub titles: Option<String>,
}

/// Response for the panel list endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct PanelsResponse {
    pub dashboard_uid: String,
    pub count: usize,
    pub panels: Vec<AggregatedPanel>,
}

/// Split a comma-separated title filter
fn parse_titles(raw: Option<&str>) -> AppResult<Vec<String>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let titles: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    if titles.is_empty() {
        return Err(AppError::InvalidRequest(
            "'titles' must name at least one panel".into(),
        ));
    }
    Ok(titles)
}

/// Which counters an engine call is recorded under
#[derive(Debug, Clone, Copy)]
enum Call {
    Aggregation,
    Picture,
}

/// Run one engine call under the request deadline, counting the outcome.
///
/// On timeout the engine future is dropped, which cancels its in-flight fetches.
async fn run<T, F>(state: &AppState, kind: Call, call: F) -> AppResult<T>
where
    F: Future<Output = crate::error::Result<T>>,
{
    if let Call::Aggregation = kind {
        state.metrics.inc_aggregations();
    }

    let result = match tokio::time::timeout(state.request_timeout, call).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::Timeout(state.request_timeout.as_secs())),
    };

    if result.is_err() {
        match kind {
            Call::Aggregation => state.metrics.inc_failures(),
            Call::Picture => state.metrics.inc_picture_failures(),
        }
    }
    result
}

/// GET /api/v1/dashboards/:uid/panels
///
/// Returns every aggregated panel of a dashboard.
///
/// Query parameters:
/// - titles: Optional comma-separated list of panel titles
pub async fn list_panels(
    State(state): State<AppState>,
    Path(dashboard_uid): Path<String>,
    Query(params): Query<PanelsQuery>,
) -> AppResult<Json<PanelsResponse>> {
    let titles = parse_titles(params.titles.as_deref())?;
    let cancel = CancellationToken::new();

    let panels = run(
        &state,
        Call::Aggregation,
        state.aggregator.aggregate(&cancel, &dashboard_uid, &titles),
    )
    .await?;
    state.metrics.inc_panels(panels.len() as u64);

    Ok(Json(PanelsResponse {
        dashboard_uid,
        count: panels.len(),
        panels,
    }))
}

/// GET /api/v1/dashboards/:uid/panels/:title
///
/// Returns the single panel with the given title.
pub async fn get_panel(
    State(state): State<AppState>,
    Path((dashboard_uid, title)): Path<(String, String)>,
) -> AppResult<Json<AggregatedPanel>> {
    let cancel = CancellationToken::new();

    let panel = run(
        &state,
        Call::Aggregation,
        state.aggregator.panel(&cancel, &dashboard_uid, &title),
    )
    .await?;
    state.metrics.inc_panels(1);

    Ok(Json(panel))
}

/// GET /api/v1/dashboards/:uid/panels/:title/picture
///
/// Looks the panel up and proxies its rendered PNG image.
pub async fn get_panel_picture(
    State(state): State<AppState>,
    Path((dashboard_uid, title)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let cancel = CancellationToken::new();
    let aggregator = &state.aggregator;

    let picture = run(&state, Call::Picture, async {
        let panel = aggregator.panel(&cancel, &dashboard_uid, &title).await?;
        aggregator.panel_picture(&cancel, &panel.image).await
    })
    .await?;
    state.metrics.inc_pictures();

    Ok(([(header::CONTENT_TYPE, "image/png")], picture))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_titles() {
        assert!(parse_titles(None).unwrap().is_empty());
        assert_eq!(
            parse_titles(Some("CPU, Errors ,,Disk")).unwrap(),
            vec!["CPU", "Errors", "Disk"]
        );
    }

    #[test]
    fn test_parse_titles_rejects_blank_filter() {
        assert!(matches!(
            parse_titles(Some(" , ")),
            Err(AppError::InvalidRequest(_))
        ));
    }
}
