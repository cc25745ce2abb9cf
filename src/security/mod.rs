//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → headers.rs (strip hop-by-hop and routing headers)
//!     → headers.rs (attach server credential from credential.rs)
//!     → forwarded upstream
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → returned to caller
//! ```
//!
//! # Design Decisions
//! - No trust in client input: credentials only come from server config
//! - The `backend_url` carrier is routing configuration, never authentication

pub mod credential;
pub mod headers;

pub use credential::ApiKey;
