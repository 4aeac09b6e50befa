//! Generic dispatch loop shared by every route.
//!
//! ```text
//! request → PathMatcher ── no match ──────────────▶ 404
//!              │
//!              ▼
//!        BreakerRegistry::admit ── deny ──────────▶ fallback 503
//!              │
//!              ▼
//!          rewrite → Dispatcher::forward → permit.report(outcome)
//!              │
//!              ├─ upstream answered ──────────────▶ upstream response (any status)
//!              └─ transport failure ──────────────▶ fallback 503
//! ```

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{validate_config, ConfigError, GatewayConfig};
use crate::http::fallback::{FallbackHandler, FallbackReason};
use crate::http::forward::Dispatcher;
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{Admission, BreakerRegistry};
use crate::resilience::outcome::{FailurePolicy, TransportErrorKind};
use crate::routing::{rewrite, PathMatcher, RouteStore};

/// Routing table, breakers, dispatcher and fallback, built once at startup.
#[derive(Debug)]
pub struct Gateway {
    routes: Arc<RouteStore>,
    matcher: PathMatcher,
    breakers: Arc<BreakerRegistry>,
    dispatcher: Dispatcher,
    fallback: FallbackHandler,
    fallback_path: String,
}

impl Gateway {
    /// Validate `config` and build every component. Any error is fatal.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let routes = Arc::new(RouteStore::load(&config.routes)?);
        let matcher = PathMatcher::new(&routes);
        let breakers = Arc::new(BreakerRegistry::from_config(config, &routes));
        let dispatcher = Dispatcher::new(&config.timeouts, FailurePolicy::from(&config.failure_policy));

        Ok(Self {
            routes,
            matcher,
            breakers,
            dispatcher,
            fallback: FallbackHandler::new(config.fallback.body.clone()),
            fallback_path: config.fallback.path.clone(),
        })
    }

    pub fn routes(&self) -> &Arc<RouteStore> {
        &self.routes
    }

    pub fn breakers(&self) -> &Arc<BreakerRegistry> {
        &self.breakers
    }

    /// Handle one inbound request end to end. Never fails.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let start_time = Instant::now();
        let request_id = request_id(&request);
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        if path == self.fallback_path && method == Method::GET {
            let response = self.fallback.respond("fallback", FallbackReason::Direct);
            metrics::record_request(method.as_str(), response.status().as_u16(), "fallback", start_time);
            return response;
        }

        // 1. Match Route
        let route = match self.matcher.match_path(&path) {
            Some(route) => route,
            None => {
                tracing::warn!(request_id = %request_id, path = %path, "No route matched");
                metrics::record_request(method.as_str(), 404, "none", start_time);
                let mut response = Response::new(Body::from("No matching route found"));
                *response.status_mut() = StatusCode::NOT_FOUND;
                return response;
            }
        };

        // 2. Breaker gate
        let permit = match self.breakers.admit(&route.breaker_name) {
            Admission::Allow(permit) => permit,
            Admission::Deny => {
                tracing::debug!(
                    request_id = %request_id,
                    route = %route.name,
                    breaker = %route.breaker_name,
                    "Breaker denied request"
                );
                let response = self.fallback.respond(&route.name, FallbackReason::CircuitOpen);
                metrics::record_request(method.as_str(), 503, &route.name, start_time);
                return response;
            }
        };
        let probe = permit.is_probe();

        // 3. Rewrite and forward
        let outgoing_path = rewrite(&route, &path).into_owned();
        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            route = %route.name,
            outgoing_path = %outgoing_path,
            probe,
            "Proxying request"
        );
        let forwarded = self.dispatcher.forward(&route, request, &outgoing_path).await;

        // 4. Feed the breaker
        self.breakers.report(permit, &forwarded.outcome);

        // 5. Respond
        match forwarded.response {
            Some(response) => {
                metrics::record_request(method.as_str(), response.status().as_u16(), &route.name, start_time);
                response
            }
            None => {
                let reason = match (probe, forwarded.outcome.transport_error) {
                    (true, _) => FallbackReason::ProbeFailed,
                    (false, kind) => FallbackReason::UpstreamUnavailable(
                        kind.unwrap_or(TransportErrorKind::Other),
                    ),
                };
                metrics::record_request(method.as_str(), 503, &route.name, start_time);
                self.fallback.respond(&route.name, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BreakerConfig, RouteConfig};
    use crate::resilience::circuit_breaker::BreakerState;

    fn unreachable_upstream() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    fn gateway(upstream: String) -> Gateway {
        let mut config = GatewayConfig::empty();
        config.routes.push(RouteConfig {
            name: "order_service".into(),
            path_predicate: "/api/order".into(),
            upstream_base_uri: upstream,
            path_rewrite: None,
            breaker_name: "orderServiceCircuitBreaker".into(),
            fallback_target: "/fallbackRoute".into(),
        });
        config.breakers.push(BreakerConfig {
            name: "orderServiceCircuitBreaker".into(),
            failure_threshold: 1,
            open_duration_ms: 60_000,
        });
        Gateway::from_config(&config).unwrap()
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_without_breaker_activity() {
        let gateway = gateway(unreachable_upstream());
        let response = gateway.handle(get("/api/unknown")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let snapshot = gateway.breakers().snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].state, BreakerState::Closed);
        assert_eq!(snapshot[0].consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back_and_opens() {
        let gateway = gateway(unreachable_upstream());

        let first = gateway.handle(get("/api/order")).await;
        assert_eq!(first.status(), StatusCode::SERVICE_UNAVAILABLE);

        let breaker = gateway.breakers().get("orderServiceCircuitBreaker").unwrap();
        assert_eq!(breaker.state(), BreakerState::Open);

        let second = gateway.handle(get("/api/order")).await;
        assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(second.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Service is not available");
    }

    #[tokio::test]
    async fn test_fallback_path_served_directly() {
        let gateway = gateway(unreachable_upstream());
        let response = gateway.handle(get("/fallbackRoute")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut config = GatewayConfig::empty();
        config.breaker_defaults.failure_threshold = 0;
        assert!(matches!(
            Gateway::from_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
