//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_fallback_total` (counter): degraded responses by route, reason
//! - `gateway_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `gateway_breaker_transitions_total` (counter): transitions by target state
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::resilience::circuit_breaker::BreakerState;

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_counter!("gateway_requests_total", "Total requests handled by the gateway");
            describe_histogram!(
                "gateway_request_duration_seconds",
                "End-to-end request latency in seconds"
            );
            describe_counter!("gateway_fallback_total", "Fallback responses served");
            describe_gauge!("gateway_breaker_state", "Breaker state (0 closed, 1 open, 2 half-open)");
            describe_counter!("gateway_breaker_transitions_total", "Breaker state transitions");
            tracing::info!(address = %addr, "Metrics endpoint started");
        }
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus exporter"),
    }
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_fallback(route: &str, reason: &'static str) {
    counter!("gateway_fallback_total", "route" => route.to_string(), "reason" => reason)
        .increment(1);
}

pub fn record_breaker_state(breaker: &str, state: BreakerState) {
    gauge!("gateway_breaker_state", "breaker" => breaker.to_string()).set(state as u8 as f64);
}

pub fn record_breaker_transition(breaker: &str, to: BreakerState) {
    counter!(
        "gateway_breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
    record_breaker_state(breaker, to);
}
