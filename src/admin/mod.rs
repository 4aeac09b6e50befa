//! Read-only admin API: route table and breaker states.

pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::http::Gateway;
use crate::lifecycle::ShutdownSignal;
use self::handlers::*;

pub fn setup_admin_router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/breakers", get(get_breakers))
        .with_state(gateway)
}

/// Serve the admin API until shutdown.
pub async fn serve(
    listener: TcpListener,
    gateway: Arc<Gateway>,
    shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Admin API starting");
    axum::serve(listener, setup_admin_router(gateway))
        .with_graceful_shutdown(shutdown.recv())
        .await
}
