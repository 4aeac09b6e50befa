//! Edge gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                      GATEWAY                          │
//!   Client Request    │  ┌──────────┐   ┌──────────────┐   ┌──────────────┐  │
//!   ──────────────────┼─▶│   http   │──▶│   routing    │──▶│  resilience  │  │
//!                     │  │  server  │   │ match/rewrite│   │   breakers   │  │
//!                     │  └──────────┘   └──────┬───────┘   └──────┬───────┘  │
//!                     │                   404  │          deny    │ allow    │
//!                     │                        ▼                  ▼          │
//!   Client Response   │  ┌──────────┐   ┌──────────────┐   ┌──────────────┐  │
//!   ◀─────────────────┼──│ response │◀──│   fallback   │   │  dispatcher  │──┼──▶ Upstream
//!                     │  │ headers  │◀──┴──────────────┴───│   forward    │◀─┼─── Service
//!                     │  └──────────┘                      └──────────────┘  │
//!                     │                                                       │
//!                     │  config · observability · lifecycle · admin           │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use edge_gateway::config::{load_config, validate_config, ConfigError, GatewayConfig};
use edge_gateway::lifecycle::startup;
use edge_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "edge-gateway")]
#[command(about = "Path-routing edge gateway with per-route circuit breakers", long_about = None)]
struct Cli {
    /// TOML configuration file. Without it the built-in route table is used.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);

    if cli.check {
        validate_config(&config).map_err(ConfigError::Validation)?;
        println!("configuration OK: {} routes", config.routes.len());
        return Ok(());
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        upstream_timeout_ms = config.timeouts.upstream_ms,
        "edge-gateway starting"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
