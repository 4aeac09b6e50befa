//! Route definition store.
//!
//! # Responsibilities
//! - Compile `RouteConfig` entries into immutable `Route` records
//! - Reject duplicate names and empty predicates
//! - Look routes up by name
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Routes are handed out as `Arc<Route>` so request tasks never copy them
//! - Declaration order is preserved for listing

use axum::http::Uri;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ConfigError, RouteConfig, ValidationError};

/// Errors returned by route lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route '{0}' not found")]
    NotFound(String),
}

/// A compiled, immutable route.
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub name: String,
    pub path_predicate: String,
    pub upstream_base_uri: String,
    pub path_rewrite: Option<String>,
    pub breaker_name: String,
    pub fallback_target: String,
    /// Parsed form of `upstream_base_uri`.
    #[serde(skip)]
    pub upstream: Uri,
}

impl Route {
    fn compile(config: &RouteConfig) -> Result<Self, ValidationError> {
        let upstream: Uri =
            config
                .upstream_base_uri
                .parse()
                .map_err(|e: axum::http::uri::InvalidUri| ValidationError::InvalidUpstream {
                    route: config.name.clone(),
                    uri: config.upstream_base_uri.clone(),
                    reason: e.to_string(),
                })?;

        if upstream.scheme().is_none() || upstream.authority().is_none() {
            return Err(ValidationError::InvalidUpstream {
                route: config.name.clone(),
                uri: config.upstream_base_uri.clone(),
                reason: "scheme and host are required".to_string(),
            });
        }

        Ok(Self {
            name: config.name.clone(),
            path_predicate: config.path_predicate.clone(),
            upstream_base_uri: config.upstream_base_uri.clone(),
            path_rewrite: config.path_rewrite.clone(),
            breaker_name: config.breaker_name.clone(),
            fallback_target: config.fallback_target.clone(),
            upstream,
        })
    }
}

/// Owns every configured route for the lifetime of the process.
#[derive(Debug, Default)]
pub struct RouteStore {
    routes: Vec<Arc<Route>>,
    by_name: HashMap<String, usize>,
}

impl RouteStore {
    /// Compile the configured routes, preserving declaration order.
    pub fn load(configs: &[RouteConfig]) -> Result<Self, ConfigError> {
        let mut errors = Vec::new();
        let mut routes = Vec::with_capacity(configs.len());
        let mut by_name = HashMap::with_capacity(configs.len());

        for config in configs {
            if config.path_predicate.is_empty() {
                errors.push(ValidationError::EmptyPredicate(config.name.clone()));
                continue;
            }
            if by_name.contains_key(&config.name) {
                errors.push(ValidationError::DuplicateRouteName(config.name.clone()));
                continue;
            }
            match Route::compile(config) {
                Ok(route) => {
                    by_name.insert(route.name.clone(), routes.len());
                    routes.push(Arc::new(route));
                }
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        tracing::debug!(count = routes.len(), "Route store loaded");
        Ok(Self { routes, by_name })
    }

    /// Look a route up by its unique name.
    pub fn lookup(&self, name: &str) -> Result<Arc<Route>, RouteError> {
        self.by_name
            .get(name)
            .map(|&i| self.routes[i].clone())
            .ok_or_else(|| RouteError::NotFound(name.to_string()))
    }

    /// All routes in declaration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
