//! Passthrough forwarding to the resolved upstream.
//!
//! # Data Flow
//! ```text
//! ForwardRequest
//!     → method check (501 for anything not forwarded)
//!     → UpstreamResolver (fresh per request)
//!     → target URI = base_url + path suffix + query
//!     → header sanitation + server credential
//!     → pooled client, streamed body, response deadline
//!     → upstream status/headers/body streamed back
//! ```

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{Method, Request, Response, Uri},
    response::IntoResponse,
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::ProxyConfig;
use crate::http::request::{request_id, ForwardRequest};
use crate::http::response::method_not_supported;
use crate::observability::metrics;
use crate::resilience::{with_upstream_timeout, UpstreamError};
use crate::routing::{ResolvedUpstream, UpstreamResolver};
use crate::security::headers::{inbound_response_headers, outbound_headers};

/// Methods forwarded upstream. Everything else except `OPTIONS` gets 501.
pub const SUPPORTED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

pub type ProxyClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the shared outbound client.
///
/// One client serves every upstream; hyper pools connections per
/// scheme and authority, so a changing upstream choice still reuses sockets.
pub fn build_client(connect_timeout: Duration) -> ProxyClient {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_nodelay(true);
    http.set_connect_timeout(Some(connect_timeout));

    let https = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new()).build(https)
}

/// Forwards supported requests to the upstream chosen for each one.
#[derive(Clone)]
pub struct PassthroughDispatcher {
    resolver: UpstreamResolver,
    client: ProxyClient,
    response_timeout: Duration,
}

impl PassthroughDispatcher {
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            resolver: UpstreamResolver::from_config(&config.upstream),
            client: build_client(Duration::from_secs(config.timeouts.connect_secs)),
            response_timeout: Duration::from_secs(config.timeouts.response_secs),
        }
    }

    /// Forward `request` and relay the upstream response.
    ///
    /// Always produces a response: unsupported methods get 501, transport
    /// failures 502, deadlines 504.
    pub async fn handle(&self, request: ForwardRequest) -> Response<Body> {
        let start = Instant::now();
        let method = request.method.clone();

        if !SUPPORTED_METHODS.contains(&method) {
            tracing::debug!(method = %method, "Rejecting unsupported method");
            metrics::record_request(&method, 501, "none", start);
            return method_not_supported(&method);
        }

        let upstream = self.resolver.resolve(request.view());
        let source = upstream.source.as_str();
        let rid = request_id(&request.headers).to_string();

        let outbound = match build_outbound(request, &upstream) {
            Ok(req) => req,
            Err(err) => {
                tracing::warn!(request_id = %rid, source, error = %err, "Cannot build upstream request");
                metrics::record_request(&method, 502, source, start);
                return err.into_response();
            }
        };

        tracing::debug!(
            request_id = %rid,
            method = %method,
            target = %outbound.uri(),
            source,
            "Forwarding request"
        );

        match with_upstream_timeout(self.response_timeout, self.client.request(outbound)).await {
            Ok(response) => {
                let status = response.status();
                metrics::record_request(&method, status.as_u16(), source, start);

                let (mut parts, body) = response.into_parts();
                parts.headers = inbound_response_headers(parts.headers);
                Response::from_parts(parts, Body::new(body))
            }
            Err(err) => {
                tracing::warn!(
                    request_id = %rid,
                    upstream = %upstream.base_url,
                    source,
                    error = %err,
                    "Upstream error"
                );
                let response = err.into_response();
                metrics::record_request(&method, response.status().as_u16(), source, start);
                response
            }
        }
    }
}

/// Absolute target URI for `request` at `base`.
pub fn target_uri(base: &url::Url, path_suffix: &str, query: Option<&str>) -> Result<Uri, UpstreamError> {
    let mut target = base.as_str().trim_end_matches('/').to_string();
    target.push_str(path_suffix);
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }
    target
        .parse::<Uri>()
        .map_err(|e| UpstreamError::InvalidTarget(e.to_string()))
}

fn build_outbound(
    request: ForwardRequest,
    upstream: &ResolvedUpstream,
) -> Result<Request<Body>, UpstreamError> {
    let uri = target_uri(&upstream.base_url, &request.path_suffix, request.query.as_deref())?;

    let mut outbound = Request::new(request.body);
    *outbound.method_mut() = request.method;
    *outbound.uri_mut() = uri;
    *outbound.headers_mut() = outbound_headers(&request.headers, upstream.credential.as_ref());
    Ok(outbound)
}
