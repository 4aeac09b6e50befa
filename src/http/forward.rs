//! Forwarding dispatcher.
//!
//! # Responsibilities
//! - Build the upstream URI from the route's base URI and the outgoing path
//! - Forward method, headers (minus hop-by-hop) and streamed body
//! - Enforce the upstream timeout
//! - Classify the result into a `ForwardOutcome`
//!
//! # Design Decisions
//! - Exactly one upstream call per admitted request, no retries
//! - Upstream responses are returned even when classified as failures
//! - Query strings are preserved, including on rewritten paths

use axum::body::Body;
use axum::http::{header, uri::PathAndQuery, Request, Response, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::Duration;

use crate::config::TimeoutConfig;
use crate::http::response::strip_hop_by_hop;
use crate::resilience::outcome::{FailurePolicy, ForwardOutcome, TransportErrorKind};
use crate::resilience::timeouts::with_deadline;
use crate::routing::Route;

/// Result of one upstream call.
pub struct Forwarded {
    pub outcome: ForwardOutcome,
    /// Present whenever the upstream answered, whatever the status.
    pub response: Option<Response<Body>>,
}

/// Issues upstream calls for admitted requests.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client<HttpConnector, Body>,
    upstream_timeout: Duration,
    policy: FailurePolicy,
}

impl Dispatcher {
    pub fn new(timeouts: &TimeoutConfig, policy: FailurePolicy) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_millis(timeouts.connect_ms)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            upstream_timeout: Duration::from_millis(timeouts.upstream_ms),
            policy,
        }
    }

    /// Forward `request` to `route`'s upstream at `outgoing_path`.
    pub async fn forward(&self, route: &Route, request: Request<Body>, outgoing_path: &str) -> Forwarded {
        let (mut parts, body) = request.into_parts();

        let uri = match upstream_uri(&route.upstream, outgoing_path, parts.uri.query()) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(route = %route.name, error = %e, "Failed to build upstream URI");
                return Forwarded {
                    outcome: ForwardOutcome::from_transport(TransportErrorKind::Other),
                    response: None,
                };
            }
        };

        strip_hop_by_hop(&mut parts.headers);
        // The client derives Host from the upstream authority.
        parts.headers.remove(header::HOST);
        parts.uri = uri;

        tracing::debug!(
            route = %route.name,
            method = %parts.method,
            upstream = %parts.uri,
            "Forwarding request"
        );

        let upstream_request = Request::from_parts(parts, body);
        match with_deadline(self.upstream_timeout, self.client.request(upstream_request)).await {
            Ok(response) => {
                let status = response.status();
                let outcome = ForwardOutcome::from_status(status.as_u16(), &self.policy);
                if !outcome.success {
                    tracing::warn!(route = %route.name, status = %status, "Upstream returned failure status");
                }

                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                Forwarded {
                    outcome,
                    response: Some(Response::from_parts(parts, Body::new(body))),
                }
            }
            Err(kind) => {
                tracing::error!(
                    route = %route.name,
                    upstream = %route.upstream_base_uri,
                    kind = %kind,
                    "Upstream request failed"
                );
                Forwarded {
                    outcome: ForwardOutcome::from_transport(kind),
                    response: None,
                }
            }
        }
    }
}

/// Join the upstream base URI, the outgoing path and the original query.
pub fn upstream_uri(base: &Uri, outgoing_path: &str, query: Option<&str>) -> Result<Uri, axum::http::Error> {
    let base_path = base.path().trim_end_matches('/');
    let path_and_query = match query {
        Some(q) => format!("{base_path}{outgoing_path}?{q}"),
        None => format!("{base_path}{outgoing_path}"),
    };

    let mut builder = Uri::builder().path_and_query(PathAndQuery::try_from(path_and_query)?);
    if let Some(scheme) = base.scheme() {
        builder = builder.scheme(scheme.clone());
    }
    if let Some(authority) = base.authority() {
        builder = builder.authority(authority.clone());
    }
    builder.build()
}
