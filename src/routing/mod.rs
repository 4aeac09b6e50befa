//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → store.rs (compile, reject duplicates)
//!     → matcher.rs (sort predicates, longest first)
//!     → Freeze as immutable RouteStore + PathMatcher
//!
//! Incoming Request (path)
//!     → matcher.rs (longest prefix lookup)
//!     → Return: matched Route or NoMatch
//!     → rewrite.rs (outgoing path for the upstream)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - Longest predicate wins

pub mod matcher;
pub mod rewrite;
pub mod store;

pub use matcher::PathMatcher;
pub use rewrite::rewrite;
pub use store::{Route, RouteError, RouteStore};
