//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request path against each route's predicate
//! - Pick the longest matching predicate
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Prefixes match on segment boundaries: `/api/order` matches `/api/order`
//!   and `/api/order/42`, never `/api/orders`
//! - No regex to guarantee O(n) matching

use std::sync::Arc;

use crate::routing::store::{Route, RouteStore};

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || self.prefix.ends_with('/'),
            None => false,
        }
    }
}

/// Selects at most one route for a request path.
///
/// Candidates are kept sorted by predicate length, longest first, so the first
/// hit is the most specific route.
#[derive(Debug)]
pub struct PathMatcher {
    candidates: Vec<(PathPrefixMatcher, Arc<Route>)>,
}

impl PathMatcher {
    pub fn new(store: &RouteStore) -> Self {
        let mut candidates: Vec<_> = store
            .routes()
            .iter()
            .map(|route| (PathPrefixMatcher::new(route.path_predicate.clone()), route.clone()))
            .collect();
        // Stable sort keeps declaration order among equal lengths.
        candidates.sort_by(|a, b| b.0.prefix().len().cmp(&a.0.prefix().len()));
        Self { candidates }
    }

    /// Find the route for a request path, or `None` for a routing-table miss.
    pub fn match_path(&self, path: &str) -> Option<Arc<Route>> {
        self.candidates
            .iter()
            .find(|(matcher, _)| matcher.matches(path))
            .map(|(_, route)| route.clone())
    }
}
