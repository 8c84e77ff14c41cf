//! Error types for the transport, the aggregation engine and the HTTP surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Failure of a single upstream HTTP call
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// What is wrong with a series returned by the datasource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesDefect {
    /// The series carries no samples at all
    NoSamples,
    /// The most recent sample is not exactly a `[timestamp, value]` pair
    NotAPair,
    /// The sample value is not string-encoded
    NonStringValue,
}

impl fmt::Display for SeriesDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SeriesDefect::NoSamples => "series has no samples",
            SeriesDefect::NotAPair => "sample is not a [timestamp, value] pair",
            SeriesDefect::NonStringValue => "sample value is not a string",
        };
        f.write_str(reason)
    }
}

/// Failure of a single metric query
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("upstream query error: {0}")]
    UpstreamQuery(String),

    #[error("malformed series {label:?}: {defect}")]
    MalformedSeries { label: String, defect: SeriesDefect },

    #[error("fetch task failed: {0}")]
    Task(String),
}

/// Metric fetch failure attributed to one panel
#[derive(Debug)]
pub struct PanelFailure {
    pub panel_id: i64,
    pub title: String,
    /// Query that failed, if the failure happened while running one
    pub query: Option<String>,
    pub source: QueryError,
}

impl fmt::Display for PanelFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panel {:?} (id {})", self.title, self.panel_id)?;
        if let Some(query) = &self.query {
            write!(f, " query {query:?}")?;
        }
        write!(f, ": {}", self.source)
    }
}

/// Every panel whose metric fetch failed during one aggregation
#[derive(Debug)]
pub struct AggregatedFetchError {
    pub failures: Vec<PanelFailure>,
}

impl AggregatedFetchError {
    /// Titles of the failing panels
    pub fn titles(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.title.as_str()).collect()
    }
}

impl fmt::Display for AggregatedFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to fetch current values for {} panel(s)",
            self.failures.len()
        )?;
        for (i, failure) in self.failures.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregatedFetchError {}

/// Aggregation engine errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to fetch dashboard {uid}: {source}")]
    DashboardFetch {
        uid: String,
        #[source]
        source: TransportError,
    },

    #[error("failed to fetch alert states for dashboard {dashboard_id}: {source}")]
    AlertFetch {
        dashboard_id: i64,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    AggregatedFetch(#[from] AggregatedFetchError),

    #[error("panel {title:?} not found on dashboard {uid} ({matches} matches)")]
    PanelNotFound {
        uid: String,
        title: String,
        matches: usize,
    },

    #[error("failed to fetch panel picture: {source}")]
    PictureFetch {
        #[source]
        source: TransportError,
    },

    #[error("aggregation cancelled")]
    Cancelled,
}

/// Result type alias using the engine error
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP-facing error
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

/// Result type alias for HTTP handlers
pub type AppResult<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Engine(Error::PanelNotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Engine(Error::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Engine(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
