//! Dynamic-upstream passthrough proxy for agent chat clients.
//!
//! The server side resolves a backend per request (cookie, header, query,
//! configured default) and forwards the call there unchanged. The client side
//! decides whether a browser session needs the proxy at all and hands the
//! backend address over through the `backend_url` cookie.

pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
