//! Network layer subsystem.
//!
//! # Design Decisions
//! - TLS is optional; when configured the proxy is itself the secure origin
//!   the browser talks to, and plain-HTTP backends stay behind it
//! - Outbound TLS lives with the client in http::forward

pub mod tls;
