//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, resolution source
//! - `proxy_request_duration_seconds` (histogram): time until response headers
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels never carry the upstream URL or credential
//! - The method label is drawn from a closed set; unknown methods are `other`

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics::{counter, histogram, Label};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Bounded label value for `method`.
pub fn method_label(method: &Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "PATCH" => "PATCH",
        "DELETE" => "DELETE",
        "OPTIONS" => "OPTIONS",
        _ => "other",
    }
}

/// Record one handled request.
pub fn record_request(method: &Method, status: u16, source: &'static str, start: Instant) {
    let labels = vec![
        Label::from_static_parts("method", method_label(method)),
        Label::new("status", status.to_string()),
        Label::from_static_parts("source", source),
    ];
    counter!("proxy_requests_total", labels.clone()).increment(1);
    histogram!("proxy_request_duration_seconds", labels).record(start.elapsed().as_secs_f64());
}
