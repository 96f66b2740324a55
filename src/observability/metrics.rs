//! Metrics collection and exposition.
//!
//! # Metrics
//! - `drops_http_requests_total` (counter): requests by method, route, status
//! - `drops_http_request_duration_seconds` (histogram): latency distribution
//! - `drops_referral_submissions_total` (counter): referral proxy outcomes
//! - `drops_verification_lookups_total` (counter): verification outcomes
//! - `drops_cache_lookups_total` (counter): cache hits, misses, expiries
//! - `drops_network_switches_total` (counter): wallet switch outcomes
//! - `drops_pairings_total` (counter): WalletConnect pairing outcomes
//!
//! Recording without an installed exporter is a no-op, so library code and
//! tests can call these freely.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    counter!("drops_http_requests_total", &labels).increment(1);
    histogram!("drops_http_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_referral(outcome: &'static str) {
    counter!("drops_referral_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_verification_lookup(outcome: &'static str) {
    counter!("drops_verification_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_lookup(cache: &'static str, outcome: &'static str) {
    counter!("drops_cache_lookups_total", "cache" => cache, "outcome" => outcome).increment(1);
}

pub fn record_network_switch(outcome: &'static str) {
    counter!("drops_network_switches_total", "outcome" => outcome).increment(1);
}

pub fn record_pairing(outcome: &'static str) {
    counter!("drops_pairings_total", "outcome" => outcome).increment(1);
}
