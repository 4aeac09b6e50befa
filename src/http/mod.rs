//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → proxy.rs (route match, breaker gate, rewrite)
//!     → forward.rs (upstream call, outcome classification)
//!     → fallback.rs (503 when degraded)
//!     → response.rs (hop-by-hop header hygiene)
//!     → Send to client
//! ```

pub mod fallback;
pub mod forward;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use fallback::{FallbackHandler, FallbackReason};
pub use forward::{Dispatcher, Forwarded};
pub use proxy::Gateway;
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
