//! Header sanitation for forwarded traffic.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Strip the proxy's own routing header before forwarding
//! - Attach the server-held credential, replacing anything the client sent
//!
//! # Design Decisions
//! - Headers listed in `Connection` are hop-by-hop too (RFC 9110 §7.6.1)
//! - `Host` is dropped; the outbound client derives it from the target URI

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::routing::BACKEND_URL_HEADER;
use crate::security::ApiKey;

/// Header the upstream reads its API key from.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

const HOP_BY_HOP: [HeaderName; 10] = [
    header::HOST,
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
];

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Build the header set sent upstream from the inbound headers.
pub fn outbound_headers(inbound: &HeaderMap, credential: Option<&ApiKey>) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(BACKEND_URL_HEADER);

    if let Some(key) = credential {
        match HeaderValue::from_str(key.expose()) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(API_KEY_HEADER, value);
            }
            Err(_) => {
                tracing::warn!("Configured API key is not a valid header value; not attached");
            }
        }
    }

    headers
}

/// Build the header set returned to the caller from the upstream headers.
pub fn inbound_response_headers(mut upstream: HeaderMap) -> HeaderMap {
    strip_hop_by_hop(&mut upstream);
    upstream
}
