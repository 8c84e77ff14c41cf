//! Service configuration and shared constants

use reqwest::Url;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Legend template that keeps the per-series label reported by the datasource.
pub const MULTI_SERIES_LEGEND: &str = "{{label}}";

/// Hours of history rendered into panel images, ending at "now".
pub const IMAGE_LOOKBACK_HOURS: i64 = 12;

/// `step` parameter for instant `query_range` calls. Irrelevant for a
/// single-point window, but the datasource requires it.
pub const QUERY_STEP_SECS: i64 = 10;

const HTTP_PREFIX: &str = "http://";

/// Errors raised while reading configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Dimensions and timezone of rendered panel images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttributes {
    pub width: u32,
    pub height: u32,
    pub timezone: String,
    /// Dashboard slug segment of the render path. Grafana ignores its value
    /// but the route requires one.
    pub slug: String,
}

impl Default for ImageAttributes {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
            timezone: "UTC".to_string(),
            slug: "panels".to_string(),
        }
    }
}

/// Connection settings for the Grafana API
#[derive(Debug, Clone)]
pub struct GrafanaConfig {
    pub base_url: Url,
    /// Sent as a bearer token, or as given when it already names a scheme
    pub token: String,
    pub timeout: Duration,
    pub datasource_id: u32,
}

/// Full service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub grafana: GrafanaConfig,
    pub image: ImageAttributes,
    pub listen_addr: SocketAddr,
    pub request_timeout: Duration,
}

impl Config {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("GRAFANA_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("GRAFANA_URL"))?;
        let base_url = parse_base_url(&raw_url).ok_or(ConfigError::Invalid {
            name: "GRAFANA_URL",
            value: raw_url.clone(),
        })?;

        let defaults = ImageAttributes::default();

        Ok(Self {
            grafana: GrafanaConfig {
                base_url,
                token: lookup("GRAFANA_TOKEN").unwrap_or_default(),
                timeout: Duration::from_secs(parse_or(&lookup, "GRAFANA_TIMEOUT_SECS", 5)?),
                datasource_id: parse_or(&lookup, "GRAFANA_DATASOURCE_ID", 1)?,
            },
            image: ImageAttributes {
                width: parse_or(&lookup, "IMAGE_WIDTH", defaults.width)?,
                height: parse_or(&lookup, "IMAGE_HEIGHT", defaults.height)?,
                timezone: lookup("IMAGE_TIMEZONE").unwrap_or(defaults.timezone),
                slug: lookup("IMAGE_SLUG").unwrap_or(defaults.slug),
            },
            listen_addr: parse_or(
                &lookup,
                "LISTEN_ADDR",
                SocketAddr::from(([0, 0, 0, 0], 3000)),
            )?,
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
        })
    }
}

/// Parse a Grafana base URL, assuming plain HTTP when no scheme is given.
pub fn parse_base_url(raw: &str) -> Option<Url> {
    let raw = raw.trim().trim_end_matches('/');
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("{HTTP_PREFIX}{raw}")
    };
    Url::parse(&with_scheme).ok()
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
