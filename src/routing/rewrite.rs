//! Outgoing path rewriting.
//!
//! A configured rewrite is a literal replacement of the whole inbound path,
//! not a pattern substitution. The aggregation routes rely on this: the
//! aggregator-facing `/aggregate/<service>/v3/api-docs` always maps to the
//! backend's fixed `/api-docs`.

use std::borrow::Cow;

use crate::routing::store::Route;

/// Compute the path to send upstream for `request_path` on `route`.
pub fn rewrite<'a>(route: &'a Route, request_path: &'a str) -> Cow<'a, str> {
    match &route.path_rewrite {
        Some(target) => Cow::Borrowed(target.as_str()),
        None => Cow::Borrowed(request_path),
    }
}
