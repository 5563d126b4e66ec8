//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Collector, fetcher, reconciler, notifier produce:
//!     → logging.rs (structured log events, one "collect" span per cycle)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics go through the `metrics` facade; without an installed
//!   recorder every update is a no-op, so tests need no setup

pub mod logging;
pub mod metrics;
