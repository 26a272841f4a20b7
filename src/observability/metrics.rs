//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): invocations by method, status, outcome
//! - `proxy_request_duration_seconds` (histogram): latency by method, outcome
//!
//! Outcomes: `preflight`, `forwarded`, `rejected` (400), `failed` (500).
//! Methods outside the standard set are labelled `other`.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus scrape endpoint. Must run inside the tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Bounded label for an HTTP method. Case-insensitive, so `options` and
/// `OPTIONS` share a series.
pub fn method_label(method: &str) -> &'static str {
    const KNOWN: [&str; 9] = [
        "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
    ];
    KNOWN
        .into_iter()
        .find(|known| known.eq_ignore_ascii_case(method))
        .unwrap_or("other")
}

/// Record one finished invocation.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start_time: Instant) {
    let method = method_label(method);
    counter!(
        "proxy_requests_total",
        "method" => method,
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        "proxy_request_duration_seconds",
        "method" => method,
        "outcome" => outcome
    )
    .record(start_time.elapsed().as_secs_f64());
}
