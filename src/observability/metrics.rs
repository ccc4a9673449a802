//! Metrics recording.
//!
//! Counters are recorded unconditionally through the `metrics` facade;
//! without an installed exporter they are no-ops. `init_metrics` wires
//! up the Prometheus exporter when the config enables it.

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(address: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(address).install() {
        Ok(()) => tracing::info!(%address, "metrics exporter listening"),
        Err(err) => tracing::error!(%err, "failed to install metrics exporter"),
    }
}

/// Count a completed request by method and response status.
pub fn record_request(method: &'static str, status: u16) {
    counter!(
        "lanshare_requests_total",
        "method" => method,
        "status" => status.to_string(),
    )
    .increment(1);
}

/// Count a denial at the gate by reason.
pub fn record_denied(reason: &'static str) {
    counter!("lanshare_denied_total", "reason" => reason).increment(1);
}

/// Count an upload request outcome.
pub fn record_upload(accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    counter!("lanshare_uploads_total", "outcome" => outcome).increment(1);
}
