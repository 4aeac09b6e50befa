use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::http::Gateway;
use crate::resilience::circuit_breaker::{BreakerSnapshot, BreakerState};
use crate::routing::Route;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routes: usize,
    pub breakers: usize,
    pub open_breakers: usize,
}

pub async fn get_status(State(gateway): State<Arc<Gateway>>) -> Json<SystemStatus> {
    let breakers = gateway.breakers().snapshot();
    let open_breakers = breakers
        .iter()
        .filter(|b| b.state != BreakerState::Closed)
        .count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if open_breakers == 0 { "operational" } else { "degraded" },
        routes: gateway.routes().len(),
        breakers: breakers.len(),
        open_breakers,
    })
}

pub async fn get_routes(State(gateway): State<Arc<Gateway>>) -> Json<Vec<Route>> {
    Json(
        gateway
            .routes()
            .routes()
            .iter()
            .map(|route| route.as_ref().clone())
            .collect(),
    )
}

pub async fn get_breakers(State(gateway): State<Arc<Gateway>>) -> Json<Vec<BreakerSnapshot>> {
    Json(gateway.breakers().snapshot())
}
