//! Persistence of configurations, executions, and notifications.
//!
//! # Design Decisions
//! - The collector only talks to the [`Store`] trait
//! - Each target's reconciliation is committed with one `commit_execution`
//!   call, so a failure never rolls back targets committed earlier in a cycle
//! - No store operation spans a whole cycle

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::history::types::{ExecutionRecord, ExecutionUpdate};
use crate::notifications::types::NotificationRecord;
use crate::targets::TargetConfiguration;

pub use memory::InMemoryStore;

/// Errors raised by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence used by the collector.
#[async_trait]
pub trait Store: Send + Sync {
    /// All configured targets. Read-only to the collector.
    async fn list_configurations(&self) -> StoreResult<Vec<TargetConfiguration>>;

    /// Execution record of a target, with entries and history.
    async fn get_execution(&self, name: &str) -> StoreResult<Option<ExecutionRecord>>;

    /// Add or update an execution and remove dropped entries in one unit.
    async fn commit_execution(&self, update: &ExecutionUpdate) -> StoreResult<()>;

    /// Newest notifications for a target, ordered by `last_notified`
    /// descending, then by id descending.
    async fn latest_notifications(&self, name: &str, limit: usize) -> StoreResult<Vec<NotificationRecord>>;

    /// Record a delivered notification. The store assigns its id.
    async fn add_notification(&self, record: NotificationRecord) -> StoreResult<NotificationRecord>;

    /// Make committed changes durable. Called once at the end of a cycle.
    async fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}
