//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → circuit_breaker.rs (admit or deny by breaker name)
//!     → timeouts.rs (connect/upstream deadline)
//!     → outcome.rs (classify status or transport error)
//!     → circuit_breaker.rs (report outcome through the permit)
//! ```
//!
//! # Design Decisions
//! - Every upstream call has a deadline
//! - No retries; a failed call goes straight to the fallback
//! - One breaker per name, shared by every route that names it

pub mod circuit_breaker;
pub mod outcome;
pub mod timeouts;

pub use circuit_breaker::{Admission, BreakerPermit, BreakerRegistry, BreakerState, CircuitBreaker};
pub use outcome::{FailurePolicy, ForwardOutcome, TransportErrorKind};
