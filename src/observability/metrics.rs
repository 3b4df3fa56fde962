//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forwarded_requests_total` (counter): requests seen by the normalizer, by outcome
//! - `forwarded_proto_total` (counter): derived scheme, by scheme

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::normalize::Normalized;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record the result of one normalization pass.
pub fn record_normalized(outcome: &Normalized) {
    let result = if outcome.is_untouched() { "untouched" } else { "rewritten" };
    counter!("forwarded_requests_total", "outcome" => result).increment(1);

    if let Some(secure) = outcome.secure {
        let scheme = if secure { "https" } else { "http" };
        counter!("forwarded_proto_total", "scheme" => scheme).increment(1);
    }
}
