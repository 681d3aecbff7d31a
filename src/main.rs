use anyhow::{Context, Result};
use censo::{config::Config, duck::ParquetStore, fetch::RemoteFile, handler::Lookup, http};
use reqwest::Client;
use std::{env, sync::Arc};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();

    // ─── 2) configuration ────────────────────────────────────────────
    let config = Config::from_env()?;
    info!(
        url = %config.parquet_url,
        local = %config.local_file.display(),
        max = config.rate_limit_max,
        window = ?config.rate_limit_window,
        "startup"
    );

    // ─── 3) shared resources, built once ─────────────────────────────
    let store = ParquetStore::open_in_memory(&config.local_file)
        .context("opening in-memory DuckDB")?;
    let remote = RemoteFile::new(
        Client::new(),
        config.parquet_url.clone(),
        config.local_file.clone(),
    );
    let lookup = Arc::new(Lookup::new(remote, Arc::new(store)));

    // ─── 4) serve ────────────────────────────────────────────────────
    http::serve(&config, lookup)
        .await
        .with_context(|| format!("binding port {}", config.port))?;

    info!("stopped");
    Ok(())
}
