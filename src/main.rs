//! Backend passthrough proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │               PASSTHROUGH PROXY               │
//!   Browser request       │                                               │
//!   ──────────────────────┼─▶ OPTIONS? ──yes──▶ 204 preflight             │
//!                         │      │ no                                     │
//!                         │      ▼                                        │
//!                         │  method check ──unsupported──▶ 501            │
//!                         │      │                                        │
//!                         │      ▼                                        │
//!                         │  resolver: cookie → header → query → default  │
//!                         │      │                                        │
//!                         │      ▼                                        │
//!   Browser response      │  pooled client ─── stream ───────────────────┼──▶ Backend
//!   ◀─────────────────────┼─── status/headers/body ◀─────────────────────┼─── (502/504 on failure)
//!                         └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use backend_passthrough::config::load_config;
use backend_passthrough::http::HttpServer;
use backend_passthrough::lifecycle::{signals, Shutdown};
use backend_passthrough::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "backend-passthrough")]
#[command(about = "Passthrough proxy that picks its backend per request", long_about = None)]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);

    tracing::info!("backend-passthrough v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        mount_path = %config.upstream.mount_path,
        default_upstream = %config.upstream.default_url,
        credential_configured = config.upstream.api_key.is_some(),
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
