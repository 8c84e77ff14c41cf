//! Aggregation engine - joins panel structure, alert state and live values

use bytes::Bytes;
use crossbeam::queue::ArrayQueue;
use futures_util::future::join_all;
use reqwest::Url;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::extract;
use super::image::{build_image_url, RenderWindow};
use super::resolve::resolve_panels;
use crate::config::ImageAttributes;
use crate::error::{AggregatedFetchError, Error, PanelFailure, QueryError, Result};
use crate::models::{AggregatedPanel, AlertState, MetricQuery, MetricSnapshot, PanelDefinition};
use crate::transport::dto::AlertStateRecord;
use crate::transport::Transport;

/// Why a panel task stopped without producing snapshots
enum TaskAbort {
    Cancelled,
    Failed { query: String, source: QueryError },
}

/// Stateless panel aggregator. Every call re-fetches all upstream state.
#[derive(Clone)]
pub struct Aggregator {
    transport: Arc<dyn Transport>,
    base_url: Url,
    image: ImageAttributes,
}

impl Aggregator {
    /// Create an aggregator over a shared transport
    ///
    /// # Arguments
    /// * `transport` - Upstream access, shared by all fan-out tasks
    /// * `base_url` - Grafana base URL used for rendered image references
    /// * `image` - Rendered image dimensions and timezone
    pub fn new(transport: Arc<dyn Transport>, base_url: Url, image: ImageAttributes) -> Self {
        Self {
            transport,
            base_url,
            image,
        }
    }

    /// Aggregate every panel of a dashboard, optionally restricted to `titles`.
    ///
    /// Succeeds only when every selected panel was fully fetched. When one or
    /// more panels fail, all failures are reported together and no panel is
    /// returned. Callers must not rely on the order of the result.
    pub async fn aggregate(
        &self,
        cancel: &CancellationToken,
        dashboard_uid: &str,
        titles: &[String],
    ) -> Result<Vec<AggregatedPanel>> {
        info!(dashboard_uid, titles = titles.len(), "Aggregating dashboard panels");

        let dashboard = cancellable(cancel, self.transport.fetch_dashboard(dashboard_uid))
            .await?
            .map_err(|source| Error::DashboardFetch {
                uid: dashboard_uid.to_string(),
                source,
            })?;
        let snapshot = resolve_panels(&dashboard);

        let alert_states = cancellable(cancel, self.transport.fetch_alert_states(snapshot.id))
            .await?
            .map_err(|source| Error::AlertFetch {
                dashboard_id: snapshot.id,
                source,
            })?;
        let alerts = alert_map(alert_states);

        let panels = filter_panels(snapshot.panels, titles);
        debug!(
            dashboard_uid,
            dashboard_id = snapshot.id,
            panels = panels.len(),
            alerts = alerts.len(),
            "Resolved dashboard"
        );

        let metrics = self.fetch_metrics(cancel, &panels).await?;

        let window = RenderWindow::now();
        let aggregated: Vec<AggregatedPanel> = panels
            .into_iter()
            .zip(metrics)
            .map(|(panel, metrics)| {
                let mut alert = panel.alert;
                if let Some(state) = alerts.get(&panel.id) {
                    alert.name = state.name.clone();
                    alert.state = state.state.clone();
                }

                AggregatedPanel {
                    image: build_image_url(
                        &self.base_url,
                        dashboard_uid,
                        panel.id,
                        window,
                        &self.image,
                    ),
                    title: panel.title,
                    alert,
                    metrics,
                }
            })
            .collect();

        info!(dashboard_uid, panels = aggregated.len(), "Dashboard aggregated");
        Ok(aggregated)
    }

    /// Look up exactly one panel by title
    pub async fn panel(
        &self,
        cancel: &CancellationToken,
        dashboard_uid: &str,
        title: &str,
    ) -> Result<AggregatedPanel> {
        let mut panels = self
            .aggregate(cancel, dashboard_uid, &[title.to_string()])
            .await?;

        if panels.len() == 1 {
            return Ok(panels.remove(0));
        }

        Err(Error::PanelNotFound {
            uid: dashboard_uid.to_string(),
            title: title.to_string(),
            matches: panels.len(),
        })
    }

    /// Download the rendered image behind a panel's image reference
    pub async fn panel_picture(&self, cancel: &CancellationToken, url: &str) -> Result<Bytes> {
        cancellable(cancel, self.transport.fetch_picture(url))
            .await?
            .map_err(|source| Error::PictureFetch { source })
    }

    /// Fetch the snapshots of every panel concurrently.
    ///
    /// One task per panel, all spawned before any is awaited. Each task owns
    /// the slot behind its own join handle; failures go to a queue sized to
    /// the task count, so reporting never blocks. The returned list is
    /// aligned with `panels`.
    async fn fetch_metrics(
        &self,
        cancel: &CancellationToken,
        panels: &[PanelDefinition],
    ) -> Result<Vec<Vec<MetricSnapshot>>> {
        if panels.is_empty() {
            return Ok(Vec::new());
        }

        let tasks = cancel.child_token();
        // Dropping this future (timeout, client gone) stops every fetch task.
        let _stop_tasks = tasks.clone().drop_guard();
        let failures = Arc::new(ArrayQueue::new(panels.len()));

        let mut handles = Vec::with_capacity(panels.len());
        for (index, panel) in panels.iter().enumerate() {
            let transport = Arc::clone(&self.transport);
            let token = tasks.clone();
            let failures = Arc::clone(&failures);
            let panel_id = panel.id;
            let title = panel.title.clone();
            let queries = panel.queries.clone();

            handles.push(tokio::spawn(async move {
                match fetch_panel(transport.as_ref(), &token, &queries).await {
                    Ok(snapshots) => {
                        debug!(panel_id, title = %title, queries = snapshots.len(), "Panel values fetched");
                        Some(snapshots)
                    }
                    Err(TaskAbort::Cancelled) => None,
                    Err(TaskAbort::Failed { query, source }) => {
                        warn!(panel_id, title = %title, query = %query, error = %source, "Panel value fetch failed");
                        let failure = PanelFailure {
                            panel_id,
                            title,
                            query: Some(query),
                            source,
                        };
                        // One push per task into a queue of task-count capacity
                        let _ = failures.push((index, failure));
                        None
                    }
                }
            }));
        }

        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            joined = join_all(handles) => joined,
        };
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut slots = Vec::with_capacity(panels.len());
        let mut task_errors = Vec::new();
        for (index, result) in joined.into_iter().enumerate() {
            match result {
                Ok(slot) => slots.push(slot),
                Err(join_error) => {
                    let panel = &panels[index];
                    task_errors.push((
                        index,
                        PanelFailure {
                            panel_id: panel.id,
                            title: panel.title.clone(),
                            query: None,
                            source: QueryError::Task(join_error.to_string()),
                        },
                    ));
                    slots.push(None);
                }
            }
        }

        let mut reported: Vec<(usize, PanelFailure)> =
            std::iter::from_fn(|| failures.pop()).collect();
        reported.extend(task_errors);

        if !reported.is_empty() {
            reported.sort_by_key(|(index, _)| *index);
            let err = AggregatedFetchError {
                failures: reported.into_iter().map(|(_, failure)| failure).collect(),
            };
            warn!(failed = err.failures.len(), panels = panels.len(), "Aggregation failed");
            return Err(err.into());
        }

        // Every slot is filled once no failure was reported and nothing was cancelled
        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or(Error::Cancelled)
    }
}

/// Fetch the snapshots of one panel's queries, in declaration order
async fn fetch_panel(
    transport: &dyn Transport,
    cancel: &CancellationToken,
    queries: &[MetricQuery],
) -> std::result::Result<Vec<MetricSnapshot>, TaskAbort> {
    let mut snapshots = Vec::with_capacity(queries.len());

    for query in queries {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TaskAbort::Cancelled),
            response = transport.fetch_metric_snapshot(&query.query) => response,
        };

        let snapshot = response
            .map_err(QueryError::from)
            .and_then(|response| extract::snapshot(query, &response))
            .map_err(|source| TaskAbort::Failed {
                query: query.query.clone(),
                source,
            })?;
        snapshots.push(snapshot);
    }

    Ok(snapshots)
}

/// Race an upstream call against cancellation
async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        out = fut => Ok(out),
    }
}

/// Index live alert states by panel id
fn alert_map(records: Vec<AlertStateRecord>) -> HashMap<i64, AlertState> {
    records
        .into_iter()
        .map(|r| {
            (
                r.panel_id,
                AlertState {
                    panel_id: r.panel_id,
                    name: r.name,
                    state: r.state,
                },
            )
        })
        .collect()
}

/// Keep only panels whose title is in `titles`; an empty filter keeps all
fn filter_panels(panels: Vec<PanelDefinition>, titles: &[String]) -> Vec<PanelDefinition> {
    if titles.is_empty() {
        return panels;
    }

    let wanted: HashSet<&str> = titles.iter().map(String::as_str).collect();
    panels
        .into_iter()
        .filter(|p| wanted.contains(p.title.as_str()))
        .collect()
}
