pub mod api;
pub mod config;
pub mod data_structures;

use crate::config::AppConfig;
use crate::data_structures::AppState;
use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tickerdash::prelude::*;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "tickerdash=info,tickerdash_server=info";

// `RUST_LOG` when set and valid, otherwise info for both crates
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn build_provider(app_config: &AppConfig) -> anyhow::Result<Arc<dyn MarketDataProvider>> {
    let provider: Arc<dyn MarketDataProvider> = match app_config.source {
        SourceKind::Yahoo => Arc::new(YahooProvider::new(true).context("Failed to build HTTP client")?),
        SourceKind::Csv => Arc::new(CsvDirProvider::new(&app_config.data_dir)),
    };

    if app_config.cache_ttl.is_zero() {
        tracing::info!(provider = provider.name(), "Response memoization disabled");
        return Ok(provider);
    }

    tracing::info!(provider = provider.name(), ttl = ?app_config.cache_ttl, "Memoizing provider responses");
    Ok(Arc::new(CachedProvider::new(provider, app_config.cache_ttl)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = AppConfig::load()?;

    // Initialize tracing with node_name in all logs
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_target(false)
        .init();

    // Set a global span with node_name for all subsequent logs
    let _span = tracing::info_span!("node", name = %app_config.node_name).entered();

    tracing::info!("Starting tickerdash-server");
    tracing::info!(
        ?app_config.environment,
        port = app_config.port,
        source = ?app_config.source,
        short = app_config.windows.short(),
        long = app_config.windows.long(),
        "Loaded configuration"
    );

    let pipeline = SeriesPipeline::new(build_provider(&app_config)?);
    let port = app_config.port;
    let app_state = AppState::new(pipeline, app_config);

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .finish()
            .context("Invalid rate limit configuration")?,
    );

    let app = api::router(app_state).layer(GovernorLayer::new(governor_conf));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_defaults_to_info() {
        let filter = log_filter(None).to_string();
        assert!(filter.contains("tickerdash=info"));
        assert!(filter.contains("tickerdash_server=info"));

        let custom = log_filter(Some("tickerdash=debug")).to_string();
        assert!(custom.contains("tickerdash=debug"));
        assert!(!custom.contains("tickerdash_server"));
    }
}
