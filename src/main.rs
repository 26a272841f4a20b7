//! aem-proxy
//!
//! ```text
//!     Browser                     aem-proxy                          AEM
//!   ───────────▶ origin allow-list ─▶ OPTIONS? ──yes──▶ preflight 200
//!                                        │no
//!                                        ▼
//!                      aem-url present ─▶ destination allow-list
//!                                        │
//!                                        ▼
//!                      <aem-url>/<path ; → %3B>  ── GET + authorization ──▶
//!   ◀─────────── 200 text/JSON + CORS  ◀──────────────────────────────────
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use aem_proxy::config::{load_with_env, watcher::ConfigWatcher};
use aem_proxy::lifecycle::{signals, Shutdown};
use aem_proxy::observability::{logging, metrics};
use aem_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "aem-proxy")]
#[command(about = "Allow-listed CORS proxy for AEM persisted queries", long_about = None)]
struct Cli {
    /// TOML configuration file; watched for allow-list changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override observability.log_level.
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_with_env(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "aem-proxy starting");

    if config.access.allowlist_origin.is_open() {
        tracing::warn!("Origin allow-list is empty, every origin is accepted");
    }
    if config.access.allowlist_destination.is_open() {
        tracing::warn!("Destination allow-list is empty, every destination is accepted");
    }

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
