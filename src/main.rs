//! Round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                LOAD BALANCER                 │
//!                         │                                              │
//!   Client Request        │  ┌────────┐    ┌────────────┐    ┌────────┐  │
//!   ──────────────────────┼─▶│  http  │───▶│ dispatcher │───▶│  pool  │  │
//!                         │  │ server │    │  (state    │    │ (round │  │
//!                         │  └────────┘    │  machine)  │    │ robin) │  │
//!                         │                └─────┬──────┘    └───┬────┘  │
//!                         │                      │ on failure    │       │
//!                         │                      ▼               ▼       │
//!                         │               ┌────────────┐   ┌──────────┐  │
//!   Client Response       │               │  failover  │   │ backend  │◀─┼── Backend
//!   ◀─────────────────────┼───────────────│ controller │   │ upstream │  │   Servers
//!                         │               └────────────┘   └──────────┘  │
//!                         │                                      ▲       │
//!                         │               ┌────────────────┐     │       │
//!                         │               │ health monitor │─────┘       │
//!                         │               │  (TCP probes)  │             │
//!                         │               └────────────────┘             │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use lb_proxy::config::load_config;
use lb_proxy::lifecycle::{signals, startup, Shutdown, StartupError};
use lb_proxy::observability::logging;
use lb_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "lb-proxy")]
#[command(about = "Round-robin HTTP load balancer with retries and health checks", long_about = None)]
struct Cli {
    /// Configuration file (.json or .toml).
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Log level used when RUST_LOG is not set.
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    tracing::info!("lb-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Fatal error");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let config = load_config(&cli.config)?;

    tracing::info!(
        config = %cli.config.display(),
        port = config.port,
        backends = config.backends.len(),
        "Configuration loaded"
    );

    let pool = Arc::new(startup::build_pool(&config)?);
    let listener = startup::bind_listener(&config).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        trigger.trigger();
    });

    HttpServer::new(&config, pool)
        .run(listener, server_shutdown)
        .await
        .map_err(StartupError::Serve)?;

    Ok(())
}
