//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware)
//!     → cors.rs (OPTIONS answered here, any path)
//!     → request.rs (request ID, split into ForwardRequest)
//!     → forward.rs (resolve upstream, forward, stream response back)
//!     → response.rs (proxy-generated 501 / 502 / 504)
//!     → Send to client
//! ```

pub mod cors;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{PassthroughDispatcher, SUPPORTED_METHODS};
pub use request::{ForwardRequest, X_REQUEST_ID};
pub use server::HttpServer;
