//! Metrics collection and exposition.
//!
//! # Metrics
//! - `site_route_decisions_total` (counter): decisions by outcome and rule
//! - `site_upstream_requests_total` (counter): forwarded requests by status
//! - `site_upstream_duration_seconds` (histogram): upstream latency
//! - `site_analytics_injections_total` (counter): injected scripts by integration
//! - `site_analytics_cancelled_total` (counter): deferred injections cancelled by unmount
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::RouteDecision;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_decision(decision: &RouteDecision) {
    metrics::counter!(
        "site_route_decisions_total",
        "outcome" => decision.outcome(),
        "rule" => decision.reason().as_str()
    )
    .increment(1);
}

pub fn record_upstream(status: u16, start: Instant) {
    metrics::counter!("site_upstream_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("site_upstream_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_injection(integration: &'static str) {
    metrics::counter!("site_analytics_injections_total", "integration" => integration).increment(1);
}

pub fn record_injections_cancelled(count: usize) {
    metrics::counter!("site_analytics_cancelled_total").increment(count as u64);
}
