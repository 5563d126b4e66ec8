//! Collection cycles.
//!
//! # Data Flow
//! ```text
//! Scheduler tick (scheduler.rs)
//!     → Collector::collect (cycle.rs), targets in ascending id order:
//!         cancelled? → stop
//!         interceptors.on_before_target
//!         ReportFetcher::fetch
//!         Transition + NotificationDebouncer → NotificationSink
//!         HistoryReconciler → Store::commit_execution
//!         interceptors.on_after_target
//!     → Store::flush
//! ```
//!
//! # Design Decisions
//! - Targets run sequentially within a cycle; no fan-out
//! - Cancellation is checked between targets, never mid-fetch
//! - A persistence failure fails only its target; the cycle goes on
//! - Overlapping cycles serialize per target, never per cycle

pub mod cycle;
pub mod interceptor;
pub mod scheduler;

use thiserror::Error;
use uuid::Uuid;

use crate::report::types::HealthStatus;
use crate::store::StoreError;

pub use cycle::Collector;
pub use interceptor::{CollectorInterceptor, InterceptorError};
pub use scheduler::Scheduler;

/// Errors surfaced by a collection cycle.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The target list could not be read; nothing was processed.
    #[error("failed to list targets: {0}")]
    ListTargets(#[source] StoreError),

    /// A target's reconciliation could not be committed.
    #[error("failed to persist execution of '{target}': {source}")]
    Persistence {
        target: String,
        #[source]
        source: StoreError,
    },
}

/// Lifecycle of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl CycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleState::Idle => "idle",
            CycleState::Running => "running",
            CycleState::Completed => "completed",
            CycleState::Cancelled => "cancelled",
        }
    }
}

/// Outcome of one target within a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    pub name: String,
    pub status: HealthStatus,
    pub notified_down: bool,
    pub notified_up: bool,
}

/// Summary of a finished cycle.
#[derive(Debug)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub state: CycleState,
    /// Targets whose processing completed, in processing order.
    pub outcomes: Vec<TargetOutcome>,
    /// Targets whose reconciliation failed.
    pub failures: Vec<CollectorError>,
}

impl CycleReport {
    fn new(cycle_id: Uuid) -> Self {
        Self {
            cycle_id,
            state: CycleState::Idle,
            outcomes: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn transition(&mut self, to: CycleState) {
        tracing::debug!(cycle_id = %self.cycle_id, from = self.state.as_str(), to = to.as_str(), "Cycle state changed");
        self.state = to;
    }

    pub fn outcome(&self, name: &str) -> Option<&TargetOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}
