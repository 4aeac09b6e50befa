//! Fallback handler.
//!
//! Every degraded response is the same: 503, `text/plain`, fixed body, no
//! `Retry-After`. Building it cannot fail.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Response, StatusCode};

use crate::observability::metrics;
use crate::resilience::outcome::TransportErrorKind;

/// Why a request ended on the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Breaker denied admission.
    CircuitOpen,
    /// The half-open probe could not reach the upstream.
    ProbeFailed,
    /// Transport failure on an admitted request.
    UpstreamUnavailable(TransportErrorKind),
    /// The fallback path itself was requested.
    Direct,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::CircuitOpen => "circuit_open",
            FallbackReason::ProbeFailed => "probe_failed",
            FallbackReason::UpstreamUnavailable(_) => "upstream_unavailable",
            FallbackReason::Direct => "direct",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FallbackHandler {
    body: Bytes,
}

impl FallbackHandler {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: Bytes::from(body.into()),
        }
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Build the degraded response for `route`.
    pub fn respond(&self, route: &str, reason: FallbackReason) -> Response<Body> {
        tracing::info!(route = %route, reason = reason.as_str(), "Serving fallback response");
        metrics::record_fallback(route, reason.as_str());

        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fallback_response() {
        let handler = FallbackHandler::new("Service is not available");
        let response = handler.respond("order_service", FallbackReason::CircuitOpen);

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert!(response.headers().get(header::RETRY_AFTER).is_none());

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Service is not available");
    }
}
