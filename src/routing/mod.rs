//! Upstream routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (headers + URI)
//!     → source.rs (cookie, header, query extractors)
//!     → resolver.rs (first valid candidate wins, else configured default)
//!     → ResolvedUpstream { base_url, source, credential }
//! ```
//!
//! # Design Decisions
//! - Precedence is fixed: cookie, header, query, default
//! - Resolution runs per request; nothing is cached between requests
//! - No network access and no errors: malformed candidates are skipped

pub mod resolver;
pub mod source;

pub use resolver::{ResolvedUpstream, UpstreamResolver};
pub use source::{
    parse_upstream_url, CandidateSource, RequestView, BACKEND_URL_COOKIE, BACKEND_URL_HEADER,
    BACKEND_URL_QUERY,
};
