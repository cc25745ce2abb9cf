//! CORS preflight answers.
//!
//! Browsers send `OPTIONS` before cross-origin calls that carry custom
//! headers such as `x-backend-url`. The proxy answers these itself; they never
//! reach routing or the upstream.

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Response, StatusCode},
};

use crate::http::forward::SUPPORTED_METHODS;

/// Headers a browser may send on proxied calls.
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-Api-Key, X-Backend-Url";

/// `Access-Control-Allow-Methods` value: the forwarded verbs plus `OPTIONS`.
pub fn allowed_methods() -> String {
    SUPPORTED_METHODS
        .iter()
        .chain(std::iter::once(&Method::OPTIONS))
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the 204 preflight response.
pub fn preflight_response() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    if let Ok(methods) = HeaderValue::from_str(&allowed_methods()) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, methods);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );

    response
}
