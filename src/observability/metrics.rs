//! Metrics collection and exposition.
//!
//! # Metrics
//! - `jsonapi_requests_total` (counter): requests by method, status, resource
//! - `jsonapi_request_duration_seconds` (histogram): dispatch latency
//! - `jsonapi_method_not_allowed_total` (counter): 405s by resource, method
//!
//! # Design Decisions
//! - Prometheus exporter serves its own listener, separate from the API
//! - Labels stay low-cardinality: resource type, never the concrete path

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

pub const REQUESTS_TOTAL: &str = "jsonapi_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "jsonapi_request_duration_seconds";
pub const METHOD_NOT_ALLOWED_TOTAL: &str = "jsonapi_method_not_allowed_total";

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to install Prometheus exporter: {0}")]
    Install(String),
}

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    metrics::describe_counter!(REQUESTS_TOTAL, "Total number of dispatched requests");
    metrics::describe_histogram!(
        REQUEST_DURATION_SECONDS,
        "Request dispatch duration in seconds"
    );
    metrics::describe_counter!(
        METHOD_NOT_ALLOWED_TOTAL,
        "Requests rejected with 405 Method Not Allowed"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one dispatched request.
pub fn record_request(method: &str, status: u16, resource: &str, start: Instant) {
    let status = status.to_string();
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_owned(),
        "status" => status.clone(),
        "resource" => resource.to_owned()
    )
    .increment(1);
    metrics::histogram!(
        REQUEST_DURATION_SECONDS,
        "method" => method.to_owned(),
        "status" => status,
        "resource" => resource.to_owned()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_method_not_allowed(resource: &str, method: &str) {
    metrics::counter!(
        METHOD_NOT_ALLOWED_TOTAL,
        "resource" => resource.to_owned(),
        "method" => method.to_owned()
    )
    .increment(1);
}
