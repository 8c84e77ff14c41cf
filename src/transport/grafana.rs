//! reqwest-based transport for the Grafana HTTP API

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::{AlertStateRecord, DashboardResponse, QueryResponse};
use super::Transport;
use crate::config::{GrafanaConfig, QUERY_STEP_SECS};
use crate::error::TransportError;

const DASHBOARD_PATH: &str = "/api/dashboards/uid/";
const ALERTS_PATH: &str = "/api/alerts";

/// Grafana API client sharing one connection pool across all requests
#[derive(Clone)]
pub struct GrafanaClient {
    http: Client,
    base_url: Url,
    token: String,
    datasource_id: u32,
}

impl GrafanaClient {
    /// Build a client with the configured per-request timeout
    pub fn new(config: &GrafanaConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            datasource_id: config.datasource_id,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn query_path(&self) -> String {
        format!(
            "/api/datasources/proxy/{}/api/v1/query_range",
            self.datasource_id
        )
    }

    /// A token that already names its scheme (`Bearer xyz`, `Basic ...`) is sent as given
    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.http.get(url);
        match self.token.as_str() {
            "" => request,
            token if token.contains(' ') => request.header(AUTHORIZATION, token),
            token => request.bearer_auth(token),
        }
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, TransportError> {
        request.send().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })
    }

    async fn body(url: &str, response: Response) -> Result<Bytes, TransportError> {
        response.bytes().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })
    }

    /// GET a JSON document, rejecting any non-success status
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> Result<T, TransportError> {
        let response = self.send(url, request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = Self::body(url, response).await?;
        serde_json::from_slice(&body).map_err(|source| TransportError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Transport for GrafanaClient {
    async fn fetch_dashboard(&self, uid: &str) -> Result<DashboardResponse, TransportError> {
        let url = self.endpoint(&format!("{DASHBOARD_PATH}{uid}"));
        debug!(url = %url, "Fetching dashboard");

        self.get_json(&url, self.get(&url)).await
    }

    async fn fetch_alert_states(
        &self,
        dashboard_id: i64,
    ) -> Result<Vec<AlertStateRecord>, TransportError> {
        let url = self.endpoint(ALERTS_PATH);
        debug!(url = %url, dashboard_id, "Fetching alert states");

        let request = self
            .get(&url)
            .query(&[("dashboardId", dashboard_id.to_string())]);
        self.get_json(&url, request).await
    }

    async fn fetch_metric_snapshot(&self, query: &str) -> Result<QueryResponse, TransportError> {
        let url = self.endpoint(&self.query_path());
        let now = Utc::now().timestamp().to_string();
        debug!(url = %url, query, "Fetching metric snapshot");

        let request = self.get(&url).query(&[
            ("query", query.to_string()),
            ("start", now.clone()),
            ("end", now),
            ("step", QUERY_STEP_SECS.to_string()),
        ]);

        let response = self.send(&url, request).await?;
        let status = response.status();
        let body = Self::body(&url, response).await?;

        if status.is_success() {
            return serde_json::from_slice(&body)
                .map_err(|source| TransportError::Decode { url, source });
        }

        // The datasource reports query errors in the body with a 4xx status.
        // Any other error body (proxy, auth) only carries the status.
        match serde_json::from_slice::<QueryResponse>(&body) {
            Ok(decoded) if decoded.error.as_deref().is_some_and(|e| !e.is_empty()) => Ok(decoded),
            _ => Err(TransportError::Status {
                url,
                status: status.as_u16(),
            }),
        }
    }

    async fn fetch_picture(&self, url: &str) -> Result<Bytes, TransportError> {
        debug!(url, "Fetching panel picture");

        let response = self.send(url, self.get(url)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Self::body(url, response).await
    }
}
