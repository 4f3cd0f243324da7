//! Prompt relay server.
//!
//! Usage: relay-server [--config relay.toml] [--listen-addr 127.0.0.1:8000]

mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use relay_session::Relay;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP listen address (overrides config file)
    #[arg(long, env = "RELAY_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// Live-channel heartbeat interval in seconds (overrides config file)
    #[arg(long, env = "RELAY_HEARTBEAT_SECS")]
    heartbeat_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::load(args.config)?;
    if let Some(addr) = args.listen_addr {
        config.listen_addr = addr;
    }
    if let Some(secs) = args.heartbeat_secs {
        config.relay.heartbeat_interval_secs = secs;
    }

    let relay = Arc::new(Relay::new(config.relay));
    let app = relay_transport::router(relay);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!("Prompt relay listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
