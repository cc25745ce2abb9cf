//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and dispatcher produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//! HTTP spans come from tower_http's TraceLayer in http::server.
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs and is forwarded upstream
//! - The server credential never appears in any field

pub mod logging;
pub mod metrics;
