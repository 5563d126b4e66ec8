//! Suppression of repeated "down" notifications.
//!
//! When enabled, a down notification is suppressed if the two newest
//! notification records of the target agree on the up/down flag: the
//! current state has already been reported. Fewer than two records, or a
//! flip between them, always lets the notification through.

use std::sync::Arc;

use crate::store::{Store, StoreResult};

#[derive(Clone)]
pub struct NotificationDebouncer {
    store: Arc<dyn Store>,
}

impl NotificationDebouncer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Decide whether a "down" event for `name` should notify.
    pub async fn should_notify(&self, name: &str) -> StoreResult<bool> {
        let latest = self.store.latest_notifications(name, 2).await?;
        if let [first, second] = latest.as_slice() {
            if first.is_up_and_running == second.is_up_and_running {
                tracing::debug!(target_name = %name, "Suppressing repeated notification");
                return Ok(false);
            }
        }
        Ok(true)
    }
}
