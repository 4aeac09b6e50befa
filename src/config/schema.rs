//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route definitions mapping path predicates to upstreams.
    pub routes: Vec<RouteConfig>,

    /// Explicit per-breaker settings. Breakers referenced by a route but not
    /// listed here use `breaker_defaults`.
    pub breakers: Vec<BreakerConfig>,

    /// Settings applied to breakers without an explicit entry.
    pub breaker_defaults: BreakerDefaults,

    /// Upstream status codes counted as breaker failures.
    pub failure_policy: FailurePolicyConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Degraded response settings.
    pub fallback: FallbackConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Read-only admin listener.
    pub admin: AdminConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            routes: default_routes(),
            breakers: Vec::new(),
            breaker_defaults: BreakerDefaults::default(),
            failure_policy: FailurePolicyConfig::default(),
            timeouts: TimeoutConfig::default(),
            fallback: FallbackConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// An otherwise-default configuration with no routes.
    pub fn empty() -> Self {
        Self {
            routes: Vec::new(),
            ..Self::default()
        }
    }

    /// Resolve the effective settings for a breaker name.
    pub fn breaker_settings(&self, name: &str) -> BreakerSettings {
        self.breakers
            .iter()
            .find(|b| b.name == name)
            .map(|b| BreakerSettings {
                failure_threshold: b.failure_threshold,
                open_duration: Duration::from_millis(b.open_duration_ms),
            })
            .unwrap_or_else(|| self.breaker_defaults.settings())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9000".to_string(),
        }
    }
}

/// A single route definition.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Unique route identifier, used in logs and metrics.
    pub name: String,

    /// Path prefix the route answers for.
    pub path_predicate: String,

    /// Base URI of the upstream (e.g., "http://localhost:8081").
    pub upstream_base_uri: String,

    /// Literal path that replaces the whole inbound path when set.
    #[serde(default)]
    pub path_rewrite: Option<String>,

    /// Name of the breaker guarding this route.
    pub breaker_name: String,

    /// Fallback path served when the route is degraded.
    #[serde(default = "default_fallback_path")]
    pub fallback_target: String,
}

/// Explicit breaker settings for one breaker name.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BreakerConfig {
    pub name: String,

    /// Consecutive failures that open the breaker.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Time the breaker stays open before admitting a probe.
    #[serde(default = "default_open_duration_ms")]
    pub open_duration_ms: u64,
}

/// Defaults for breakers without an explicit `[[breakers]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerDefaults {
    pub failure_threshold: u32,
    pub open_duration_ms: u64,
}

impl Default for BreakerDefaults {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            open_duration_ms: default_open_duration_ms(),
        }
    }
}

impl BreakerDefaults {
    pub fn settings(&self) -> BreakerSettings {
        BreakerSettings {
            failure_threshold: self.failure_threshold,
            open_duration: Duration::from_millis(self.open_duration_ms),
        }
    }
}

/// Resolved, runtime form of a breaker's settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub open_duration: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        BreakerDefaults::default().settings()
    }
}

/// Inclusive range of upstream status codes that count as breaker failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FailurePolicyConfig {
    pub status_min: u16,
    pub status_max: u16,
}

impl Default for FailurePolicyConfig {
    fn default() -> Self {
        Self {
            status_min: 500,
            status_max: 599,
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Time allowed for the upstream to answer with response headers.
    pub upstream_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 2_000,
            upstream_ms: 10_000,
        }
    }
}

/// Degraded response settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Path the fallback handler is served on.
    pub path: String,

    /// Fixed text/plain body of every 503 fallback.
    pub body: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            path: default_fallback_path(),
            body: "Service is not available".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// "pretty" or "compact".
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin listener.
    pub enabled: bool,

    /// Admin bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:9001".to_string(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_open_duration_ms() -> u64 {
    10_000
}

fn default_fallback_path() -> String {
    "/fallbackRoute".to_string()
}

/// The product / order / inventory route table, each service with a swagger
/// aggregation route rewritten to the backend's `/api-docs`.
fn default_routes() -> Vec<RouteConfig> {
    let services = [
        ("product", "http://localhost:8080"),
        ("order", "http://localhost:8081"),
        ("inventory", "http://localhost:8082"),
    ];

    let mut routes = Vec::with_capacity(services.len() * 2);
    for (service, upstream) in services {
        routes.push(RouteConfig {
            name: format!("{service}_service"),
            path_predicate: format!("/api/{service}"),
            upstream_base_uri: upstream.to_string(),
            path_rewrite: None,
            breaker_name: format!("{service}ServiceCircuitBreaker"),
            fallback_target: default_fallback_path(),
        });
        routes.push(RouteConfig {
            name: format!("{service}_service_swagger"),
            path_predicate: format!("/aggregate/{service}-service/v3/api-docs"),
            upstream_base_uri: upstream.to_string(),
            path_rewrite: Some("/api-docs".to_string()),
            breaker_name: format!("{service}SwaggerServiceCircuitBreaker"),
            fallback_target: default_fallback_path(),
        });
    }
    routes
}
