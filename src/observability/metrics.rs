//! Metrics collection and exposition.
//!
//! # Metrics
//! - `collector_cycles_total` (counter): finished cycles by final state
//! - `collector_cycle_duration_seconds` (histogram): cycle wall time
//! - `collector_target_status` (gauge): 2=healthy, 1=degraded, 0=unhealthy
//! - `collector_fetch_failures_total` (counter): failed fetches by target
//! - `collector_notifications_total` (counter): delivered notifications by kind
//! - `collector_persistence_errors_total` (counter): failed commits and flushes

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

use crate::report::types::HealthStatus;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_cycle(state: &'static str, duration: Duration) {
    metrics::counter!("collector_cycles_total", "state" => state).increment(1);
    metrics::histogram!("collector_cycle_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_target_status(target: &str, status: HealthStatus) {
    metrics::gauge!("collector_target_status", "target" => target.to_string()).set(status as u8 as f64);
}

pub fn record_fetch_failure(target: &str) {
    metrics::counter!("collector_fetch_failures_total", "target" => target.to_string()).increment(1);
}

pub fn record_notification(kind: &'static str) {
    metrics::counter!("collector_notifications_total", "kind" => kind).increment(1);
}

pub fn record_persistence_error() {
    metrics::counter!("collector_persistence_errors_total").increment(1);
}
