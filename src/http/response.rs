//! Proxy-generated responses.
//!
//! # Responsibilities
//! - Map upstream failures to 502 / 504 with a JSON body
//! - Reject unsupported methods with 501
//!
//! # Design Decisions
//! - Upstream responses are never rewritten here; only responses the proxy
//!   produces itself go through this module
//! - Bodies are small JSON objects: `{"error": <code>, ...}`

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::resilience::UpstreamError;

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            UpstreamError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "gateway_timeout"),
            UpstreamError::Unreachable(_) | UpstreamError::InvalidTarget(_) => {
                (StatusCode::BAD_GATEWAY, "bad_gateway")
            }
        };
        (status, Json(json!({ "error": code, "message": self.to_string() }))).into_response()
    }
}

/// 501 for a method the proxy does not forward.
pub fn method_not_supported(method: &Method) -> Response {
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(json!({ "error": "method_not_supported", "method": method.as_str() })),
    )
        .into_response()
}

/// 404 for paths outside the mount prefix.
pub fn not_found(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not_found", "path": path })),
    )
        .into_response()
}
