use clap::Parser;
use log::{error, info};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use eth_tx_watcher::api::ApiServer;
use eth_tx_watcher::blockchain::{Poller, PollerConfig, RpcClient};
use eth_tx_watcher::config::AppConfig;
use eth_tx_watcher::store::MemoryStore;

#[derive(Parser)]
#[command(name = "watcher")]
#[command(about = "Watches an Ethereum-family ledger for transactions touching subscribed addresses")]
#[command(version)]
struct Args {
    /// JSON-RPC endpoint URL (overrides config)
    #[arg(long)]
    endpoint: Option<String>,

    /// HTTP API port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Polling interval in seconds (overrides config)
    #[arg(long)]
    poll_interval: Option<u64>,
}

#[tokio::main]
async fn main() -> eth_tx_watcher::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load()?;
    if let Some(endpoint) = args.endpoint {
        config.rpc.endpoint = endpoint;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(interval) = args.poll_interval {
        config.poller.poll_interval_seconds = interval;
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    info!("starting eth-tx-watcher against {}", config.rpc.endpoint);

    let store = Arc::new(MemoryStore::new());
    let client = RpcClient::with_timeout(config.rpc.endpoint.clone(), config.rpc.timeout_seconds);

    let poller = Arc::new(
        Poller::new(
            client,
            Arc::clone(&store),
            PollerConfig {
                poll_interval_seconds: config.poller.poll_interval_seconds,
            },
        )
        .await?,
    );

    // Ctrl-C flips the poller's flag; a tick already draining its backlog
    // finishes before the flag is observed.
    let shutdown = poller.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    let poller_task = tokio::spawn({
        let poller = Arc::clone(&poller);
        async move { poller.run().await }
    });

    let server = ApiServer::new(Arc::clone(&store), config.api.host.clone(), config.api.port);
    if let Err(e) = server
        .start(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    {
        error!("HTTP server failed: {}", e);
    }

    // The server returns once the signal lands; wait for the poller to
    // reach its tick boundary.
    if let Err(e) = poller_task.await {
        error!("poller task failed: {}", e);
    }
    info!("watcher stopped");

    Ok(())
}
