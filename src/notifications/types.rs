//! Notification records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A notification that was delivered for a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Insertion order, assigned by the store.
    pub id: u64,
    pub name: String,
    /// False for a "down" notification, true for a recovery.
    pub is_up_and_running: bool,
    pub last_notified: DateTime<Utc>,
    #[serde(default)]
    pub message: Option<String>,
}

impl NotificationRecord {
    pub fn new(name: impl Into<String>, is_up_and_running: bool, last_notified: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            is_up_and_running,
            last_notified,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
