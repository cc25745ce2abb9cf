//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → connector (connect timeout)
//!     → timeouts.rs (response deadline, failure classification)
//!     → 502 / 504 at the HTTP boundary
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries inside the proxy: retry is the caller's decision

pub mod timeouts;

pub use timeouts::{with_upstream_timeout, UpstreamError};
