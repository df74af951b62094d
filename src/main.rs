use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let config = shelfmark::config::ServerConfig::from_env()?;
    info!(
        target: "shelfmark",
        "shelfmark starting: RUST_LOG='{}', listen={}, catalog={:?}",
        rust_log, config.socket_addr(), config.catalog_path
    );

    shelfmark::server::run_with_config(config).await
}
