//! Health check collection and reconciliation.
//!
//! Periodically fetches health reports from configured endpoints, keeps one
//! execution record per target with a transition history, and notifies on
//! failures and recoveries.

pub mod collector;
pub mod config;
pub mod history;
pub mod lifecycle;
pub mod notifications;
pub mod observability;
pub mod report;
pub mod store;
pub mod targets;

pub use collector::{Collector, CollectorError, CycleReport, CycleState, Scheduler};
pub use config::{CollectorConfig, Config};
pub use lifecycle::Shutdown;
pub use store::{InMemoryStore, Store};
