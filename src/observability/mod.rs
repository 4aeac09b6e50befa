//! Logs and metrics.
//!
//! `logging` installs the tracing subscriber once at startup. `metrics`
//! wraps the `metrics` macros the request path and the breakers call; with
//! no exporter installed they record nothing.
//!
//! Every request log line carries the `X-Request-Id` assigned in
//! `http::server`. Breaker transitions log at `warn` (open) or `info`.

pub mod logging;
pub mod metrics;
