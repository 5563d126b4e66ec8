//! Notification delivery.
//!
//! # Responsibilities
//! - Define the sink the collector notifies
//! - Record delivered notifications so later debounce decisions can see them
//!
//! # Design Decisions
//! - The collector never depends on the sink's outcome; errors are logged
//! - Repeats of the same state inside `min_interval` are dropped by the sink

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::notifications::types::NotificationRecord;
use crate::observability::metrics;
use crate::report::types::HealthReport;
use crate::store::{Store, StoreError};

/// Errors raised while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to record notification: {0}")]
    Store(#[from] StoreError),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Receives up/down events from the collector.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify_down(&self, name: &str, report: &HealthReport) -> Result<(), NotifyError>;

    async fn notify_up(&self, name: &str) -> Result<(), NotifyError>;
}

/// Sink that records every notification in the store and logs it.
#[derive(Clone)]
pub struct RecordingNotifier {
    store: Arc<dyn Store>,
    min_interval: Duration,
}

impl RecordingNotifier {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            min_interval: Duration::ZERO,
        }
    }

    /// Drop notifications repeating the latest state within `interval`.
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    async fn notified_within_window(&self, name: &str, is_up: bool) -> Result<bool, NotifyError> {
        if self.min_interval.is_zero() {
            return Ok(false);
        }
        let latest = self.store.latest_notifications(name, 1).await?;
        let Some(last) = latest.first() else {
            return Ok(false);
        };
        let elapsed = (Utc::now() - last.last_notified).to_std().unwrap_or(Duration::ZERO);
        Ok(last.is_up_and_running == is_up && elapsed < self.min_interval)
    }

    async fn record(&self, name: &str, is_up: bool, message: String) -> Result<bool, NotifyError> {
        if self.notified_within_window(name, is_up).await? {
            tracing::debug!(target_name = %name, is_up, "Notification already sent within window");
            return Ok(false);
        }
        self.store
            .add_notification(NotificationRecord::new(name, is_up, Utc::now()).with_message(message))
            .await?;
        Ok(true)
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify_down(&self, name: &str, report: &HealthReport) -> Result<(), NotifyError> {
        let message = down_message(name, report);
        if self.record(name, false, message.clone()).await? {
            tracing::warn!(target_name = %name, status = %report.status, "{}", message);
            metrics::record_notification("down");
        }
        Ok(())
    }

    async fn notify_up(&self, name: &str) -> Result<(), NotifyError> {
        let message = format!("The HealthCheck {name} is recovered. All is up and running");
        if self.record(name, true, message.clone()).await? {
            tracing::info!(target_name = %name, "{}", message);
            metrics::record_notification("up");
        }
        Ok(())
    }
}

fn down_message(name: &str, report: &HealthReport) -> String {
    let failures: Vec<String> = report
        .failing_entries()
        .map(|(entry, description)| match description {
            Some(d) => format!("{entry}: {d}"),
            None => entry.to_string(),
        })
        .collect();
    if failures.is_empty() {
        format!("The HealthCheck {name} is failing")
    } else {
        format!("The HealthCheck {name} is failing: {}", failures.join("; "))
    }
}
