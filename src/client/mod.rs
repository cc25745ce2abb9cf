//! Client side of the proxy hand-off.
//!
//! # Data Flow
//! ```text
//! desired backend URL (config or user input)
//!     → routing.rs (proxy or direct? mixed-content check, force flag)
//!     → cookie.rs (backend_url cookie, percent-encoded, 1 hour)
//!     → threads.rs (requests against the decided base URL)
//! ```
//!
//! # Design Decisions
//! - The decision is made once per session; the cookie is refreshed each time
//! - Thread search failures degrade to an empty, flagged listing

pub mod cookie;
pub mod routing;
pub mod threads;

pub use cookie::{CookieSink, DiscardCookies, JarCookieSink, MemoryCookieSink};
pub use routing::{ClientRoutingDecision, ClientUrlResolver};
pub use threads::{list_threads, HttpThreadSearch, ThreadListing, ThreadSearch};
