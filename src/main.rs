//! Panel aggregator - serves aggregated Grafana dashboard panels over HTTP

use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use panel_aggregator::config::Config;
use panel_aggregator::engine::Aggregator;
use panel_aggregator::routes;
use panel_aggregator::state::AppState;
use panel_aggregator::transport::GrafanaClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "panel_aggregator=info,tower_http=info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Configuration
    let config = Config::from_env().context("invalid configuration")?;

    let client = GrafanaClient::new(&config.grafana).context("failed to build Grafana client")?;
    let aggregator = Aggregator::new(
        Arc::new(client),
        config.grafana.base_url.clone(),
        config.image.clone(),
    );

    let state = AppState::new(aggregator, config.request_timeout);
    let app = routes::router(state);

    info!(
        "Panel aggregator v{} starting on {}",
        env!("CARGO_PKG_VERSION"),
        config.listen_addr
    );
    info!("Grafana: {}", config.grafana.base_url);
    info!(
        width = config.image.width,
        height = config.image.height,
        timezone = %config.image.timezone,
        "Image attributes"
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
