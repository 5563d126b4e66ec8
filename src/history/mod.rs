//! Execution history.
//!
//! # Data Flow
//! ```text
//! HealthReport + TargetConfiguration
//!     → Store::get_execution (previous record, entries + history)
//!     → reconciler.rs (pure diff → ExecutionUpdate)
//!     → Store::commit_execution (one unit per target)
//! ```
//!
//! # Design Decisions
//! - One ExecutionRecord per target name; entry names unique within it
//! - Transition history is append-only
//! - The diff is pure so it can be tested without a store

pub mod reconciler;
pub mod types;

pub use reconciler::{reconcile, HistoryReconciler};
pub use types::{ExecutionEntry, ExecutionRecord, ExecutionUpdate, TransitionHistoryEntry};
