//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference the configured fallback)
//! - Validate value ranges (thresholds > 0, durations > 0, status ranges)
//! - Detect conflicting routes and breaker definitions
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::{HashMap, HashSet};
use thiserror::Error;
use url::Url;

use crate::config::schema::{BreakerConfig, GatewayConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duplicate route name '{0}'")]
    DuplicateRouteName(String),

    #[error("route '{0}' has an empty path predicate")]
    EmptyPredicate(String),

    #[error("route '{route}': path predicate '{predicate}' must start with '/'")]
    RelativePredicate { route: String, predicate: String },

    #[error("routes '{first}' and '{second}' share path predicate '{predicate}'")]
    DuplicatePredicate {
        first: String,
        second: String,
        predicate: String,
    },

    #[error("route '{route}': invalid upstream URI '{uri}': {reason}")]
    InvalidUpstream {
        route: String,
        uri: String,
        reason: String,
    },

    #[error("route '{route}': rewrite target '{target}' must start with '/'")]
    InvalidRewrite { route: String, target: String },

    #[error("route '{0}' has an empty breaker name")]
    EmptyBreakerName(String),

    #[error("route '{route}': unknown fallback target '{target}'")]
    UnknownFallback { route: String, target: String },

    #[error("breaker '{0}': failure_threshold must be at least 1")]
    ZeroThreshold(String),

    #[error("breaker '{0}': open_duration_ms must be greater than 0")]
    ZeroOpenDuration(String),

    #[error("breaker '{0}' is declared twice with different settings")]
    ConflictingBreaker(String),

    #[error("failure status range {min}..={max} is not a valid HTTP status range")]
    InvalidStatusRange { min: u16, max: u16 },

    #[error("fallback path '{0}' must start with '/'")]
    InvalidFallbackPath(String),

    #[error("timeouts must be greater than 0")]
    ZeroTimeout,
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_routes(config, &mut errors);
    validate_breakers(config, &mut errors);

    let policy = &config.failure_policy;
    if policy.status_min < 100 || policy.status_max > 599 || policy.status_min > policy.status_max {
        errors.push(ValidationError::InvalidStatusRange {
            min: policy.status_min,
            max: policy.status_max,
        });
    }

    if !config.fallback.path.starts_with('/') {
        errors.push(ValidationError::InvalidFallbackPath(config.fallback.path.clone()));
    }

    if config.timeouts.connect_ms == 0 || config.timeouts.upstream_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_routes(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let mut names = HashSet::new();
    let mut predicates: HashMap<&str, &str> = HashMap::new();

    for route in &config.routes {
        if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }

        if route.path_predicate.is_empty() {
            errors.push(ValidationError::EmptyPredicate(route.name.clone()));
        } else if !route.path_predicate.starts_with('/') {
            errors.push(ValidationError::RelativePredicate {
                route: route.name.clone(),
                predicate: route.path_predicate.clone(),
            });
        } else if let Some(first) = predicates.insert(&route.path_predicate, &route.name) {
            errors.push(ValidationError::DuplicatePredicate {
                first: first.to_string(),
                second: route.name.clone(),
                predicate: route.path_predicate.clone(),
            });
        }

        if let Err(reason) = check_upstream(&route.upstream_base_uri) {
            errors.push(ValidationError::InvalidUpstream {
                route: route.name.clone(),
                uri: route.upstream_base_uri.clone(),
                reason,
            });
        }

        if let Some(target) = &route.path_rewrite {
            if !target.starts_with('/') {
                errors.push(ValidationError::InvalidRewrite {
                    route: route.name.clone(),
                    target: target.clone(),
                });
            }
        }

        if route.breaker_name.trim().is_empty() {
            errors.push(ValidationError::EmptyBreakerName(route.name.clone()));
        }

        if route.fallback_target != config.fallback.path {
            errors.push(ValidationError::UnknownFallback {
                route: route.name.clone(),
                target: route.fallback_target.clone(),
            });
        }
    }
}

fn validate_breakers(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let mut seen: HashMap<&str, &BreakerConfig> = HashMap::new();

    for breaker in &config.breakers {
        if breaker.failure_threshold == 0 {
            errors.push(ValidationError::ZeroThreshold(breaker.name.clone()));
        }
        if breaker.open_duration_ms == 0 {
            errors.push(ValidationError::ZeroOpenDuration(breaker.name.clone()));
        }
        // Identical re-declarations are tolerated; the registry keeps one state machine.
        if let Some(previous) = seen.insert(&breaker.name, breaker) {
            if previous != breaker {
                errors.push(ValidationError::ConflictingBreaker(breaker.name.clone()));
            }
        }
    }

    if config.breaker_defaults.failure_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold("<defaults>".to_string()));
    }
    if config.breaker_defaults.open_duration_ms == 0 {
        errors.push(ValidationError::ZeroOpenDuration("<defaults>".to_string()));
    }
}

fn check_upstream(uri: &str) -> Result<(), String> {
    let url = Url::parse(uri).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    fn route(name: &str, predicate: &str) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            path_predicate: predicate.into(),
            upstream_base_uri: "http://localhost:8081".into(),
            path_rewrite: None,
            breaker_name: format!("{name}Breaker"),
            fallback_target: "/fallbackRoute".into(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_duplicate_name_and_empty_predicate() {
        let mut config = GatewayConfig::empty();
        config.routes.push(route("order_service", "/api/order"));
        config.routes.push(route("order_service", ""));

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateRouteName("order_service".into())));
        assert!(errors.contains(&ValidationError::EmptyPredicate("order_service".into())));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::empty();
        let mut bad = route("bad", "api/bad");
        bad.upstream_base_uri = "ftp://localhost".into();
        bad.path_rewrite = Some("api-docs".into());
        bad.fallback_target = "/elsewhere".into();
        config.routes.push(bad);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4, "{errors:?}");
    }

    #[test]
    fn test_duplicate_predicate_rejected() {
        let mut config = GatewayConfig::empty();
        config.routes.push(route("a", "/api/order"));
        config.routes.push(route("b", "/api/order"));

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::DuplicatePredicate { .. }));
    }

    #[test]
    fn test_breaker_declarations() {
        let mut config = GatewayConfig::empty();
        let breaker = BreakerConfig {
            name: "productServiceCircuitBreaker".into(),
            failure_threshold: 3,
            open_duration_ms: 1000,
        };
        config.breakers.push(breaker.clone());
        config.breakers.push(breaker.clone());
        assert!(validate_config(&config).is_ok());

        config.breakers.push(BreakerConfig {
            failure_threshold: 0,
            ..breaker
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroThreshold(
            "productServiceCircuitBreaker".into()
        )));
        assert!(errors.contains(&ValidationError::ConflictingBreaker(
            "productServiceCircuitBreaker".into()
        )));
    }

    #[test]
    fn test_invalid_status_range() {
        let mut config = GatewayConfig::empty();
        config.failure_policy.status_min = 600;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidStatusRange { min: 600, max: 599 }]
        );
    }
}
