//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, cache result
//! - `proxy_request_duration_seconds` (histogram): latency by cache result
//! - `proxy_cache_lookups_total` (counter): hit / miss / error
//! - `proxy_backend_fetches_total` (counter): ok / transport_error / read_error
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Outcome of the store read for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Error,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Error => "error",
        }
    }
}

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, cache: CacheStatus, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "cache" => cache.as_str()
    )
    .increment(1);

    metrics::histogram!("proxy_request_duration_seconds", "cache" => cache.as_str())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(cache: CacheStatus) {
    metrics::counter!("proxy_cache_lookups_total", "result" => cache.as_str()).increment(1);
}

pub fn record_backend_fetch(outcome: &'static str) {
    metrics::counter!("proxy_backend_fetches_total", "outcome" => outcome).increment(1);
}
