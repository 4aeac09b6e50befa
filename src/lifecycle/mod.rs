//! Process lifecycle: ordered startup, signal handling, graceful shutdown.
//!
//! ```text
//! startup::run
//!     HttpServer::new (validate + build gateway)
//!     → metrics exporter (optional)
//!     → admin listener (optional)
//!     → main listener
//!
//! signals::terminate ── SIGINT/SIGTERM ──▶ Shutdown::trigger
//!     → every ShutdownSignal resolves
//!     → servers stop accepting and drain in-flight requests
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
