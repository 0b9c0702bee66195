use anyhow::Result;
use btc_address_explorer::application::app::{App, AppConfig, Application};
use btc_address_explorer::infrastructure::mempool_client::DEFAULT_EXPLORER_URL;
use btc_address_explorer::infrastructure::memory::DEFAULT_PRICE_TTL_SECS;
use btc_address_explorer::infrastructure::shutdown::ShutdownChannel;
use btc_address_explorer::service;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Bitcoin address explorer enriching mempool.space data with USD prices"
)]
struct ExplorerProgram {
    /// Base URL of the Esplora/mempool.space explorer
    #[arg(short, long, env = "EXPLORER_URL", default_value = DEFAULT_EXPLORER_URL)]
    explorer_url: String,

    /// Number of retries
    #[arg(short, long, env = "NUM_RETRIES", default_value_t = 3)]
    num_retries: usize,

    /// Base delay between retries in milliseconds
    #[arg(long, env = "RETRY_BACKOFF_MS", default_value_t = 100)]
    retry_backoff_ms: u64,

    /// Listen port REST API
    #[arg(short, long, env = "LISTEN_PORT", default_value_t = 3000)]
    listen_port: u16,

    /// Retention of cached historical prices in seconds
    #[arg(long, env = "PRICE_CACHE_TTL_SECS", default_value_t = DEFAULT_PRICE_TTL_SECS)]
    price_cache_ttl_secs: u64,

    /// Interval between purges of expired prices in seconds
    #[arg(long, env = "CACHE_SWEEP_INTERVAL_SECS", default_value_t = 600)]
    cache_sweep_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = ExplorerProgram::parse();

    let config = AppConfig::builder()
        .explorer_url(args.explorer_url)
        .num_retries(args.num_retries)
        .retry_backoff_ms(args.retry_backoff_ms)
        .price_cache_ttl_secs(args.price_cache_ttl_secs)
        .build();

    let shutdown = ShutdownChannel::new();
    let app = Arc::new(App::new(&config)?);

    // Start the price cache sweeper
    let sweep_interval = Duration::from_secs(args.cache_sweep_interval_secs.max(1));
    let app_clone = app.clone();
    let shutdown_sweeper = shutdown.clone();
    let sweeper_handle = tokio::spawn(async move {
        app_clone
            .run_cache_sweeper(sweep_interval, shutdown_sweeper)
            .await
    });

    // Start the API server
    let mut server_handle = tokio::spawn(service::api::start_server(
        shutdown.clone(),
        app.clone(),
        args.listen_port,
    ));

    // Wait for shutdown signal, or for the server to stop on its own
    let server_exit = tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::warn!("Received Ctrl+C, shutting down...");
            None
        }
        result = &mut server_handle => {
            tracing::warn!("API server stopped, shutting down...");
            Some(result)
        }
    };

    shutdown.trigger();

    // Wait for tasks to complete
    let server_result = match server_exit {
        Some(result) => result,
        None => server_handle.await,
    };
    if let Err(e) = sweeper_handle.await {
        tracing::error!("Cache sweeper task failed: {:?}", e);
    }

    match server_result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!("API server error: {:?}", e);
            return Err(e);
        }
        Err(e) => {
            tracing::error!("API server task failed: {:?}", e);
            return Err(e.into());
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
