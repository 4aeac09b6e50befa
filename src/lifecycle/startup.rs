//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the gateway from a validated configuration
//! - Start the metrics exporter and admin API when enabled
//! - Bind the listener last, so traffic only arrives when ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::admin;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

async fn bind(address: &str) -> Result<TcpListener> {
    TcpListener::bind(address)
        .await
        .map_err(|source| GatewayError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Run the gateway until SIGINT/SIGTERM.
pub async fn run(config: GatewayConfig) -> Result<()> {
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let admin_shutdown = shutdown.subscribe();

    let server = HttpServer::new(config)?;
    let config = server.config().clone();

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    if config.admin.enabled {
        let listener = bind(&config.admin.bind_address).await?;
        let gateway = server.gateway();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, gateway, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let listener = bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    tokio::spawn(async move {
        signals::terminate().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;
    Ok(())
}
