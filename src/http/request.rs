//! Request handling and transformation.
//!
//! # Responsibilities
//! - Attach a unique request ID (UUID v4) as early as possible
//! - Split an inbound request into the parts forwarding needs
//! - Compute the path suffix below the mount prefix
//!
//! # Design Decisions
//! - The body is kept as a stream; nothing here reads it
//! - A client-supplied `x-request-id` is kept as-is

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, Method, Request, Uri},
};
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};

use crate::routing::RequestView;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that stamps `x-request-id` on requests that lack one.
pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Request ID of `headers`, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// An inbound request as the dispatcher sees it.
#[derive(Debug)]
pub struct ForwardRequest {
    pub method: Method,
    /// Path below the mount prefix, starting with `/` or empty.
    pub path_suffix: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Body,
    uri: Uri,
}

impl ForwardRequest {
    /// Split `request`, stripping `mount_path` from the front of its path.
    pub fn from_request(request: Request<Body>, mount_path: &str) -> Self {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path();
        let path_suffix = path
            .strip_prefix(mount_path)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .unwrap_or(path)
            .to_string();

        Self {
            method: parts.method,
            path_suffix,
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
            uri: parts.uri,
        }
    }

    /// Headers and URI for upstream resolution.
    pub fn view(&self) -> RequestView<'_> {
        RequestView {
            headers: &self.headers,
            uri: &self.uri,
        }
    }
}
