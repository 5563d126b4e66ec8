//! In-memory store with optional JSON snapshot persistence.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::history::types::{ExecutionRecord, ExecutionUpdate};
use crate::notifications::types::NotificationRecord;
use crate::store::{Store, StoreError, StoreResult};
use crate::targets::{TargetConfiguration, TargetId};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    executions: Vec<ExecutionRecord>,
    notifications: Vec<NotificationRecord>,
}

/// Thread-safe store. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    configurations: Arc<RwLock<BTreeMap<TargetId, TargetConfiguration>>>,
    executions: Arc<DashMap<String, ExecutionRecord>>,
    notifications: Arc<Mutex<Vec<NotificationRecord>>>,
    next_notification_id: Arc<AtomicU64>,
    snapshot_path: Option<PathBuf>,
    /// Held across the temp-file write and the rename.
    snapshot_lock: Arc<Mutex<()>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by a snapshot file, loading it if it exists.
    pub async fn open_snapshot(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let store = Self {
            snapshot_path: Some(path.to_path_buf()),
            ..Self::default()
        };

        if tokio::fs::try_exists(path).await? {
            let bytes = tokio::fs::read(path).await?;
            let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
            let max_id = snapshot.notifications.iter().map(|n| n.id).max().unwrap_or(0);
            store.next_notification_id.store(max_id, Ordering::SeqCst);
            for record in snapshot.executions {
                store.executions.insert(record.name.clone(), record);
            }
            *store.notifications.lock().await = snapshot.notifications;
            tracing::info!(
                path = %path.display(),
                executions = store.executions.len(),
                "Loaded execution snapshot"
            );
        }
        Ok(store)
    }

    /// Write executions and notifications to the snapshot file, if any.
    pub async fn save_snapshot(&self) -> StoreResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let _guard = self.snapshot_lock.lock().await;

        let mut executions: Vec<_> = self.executions.iter().map(|r| r.value().clone()).collect();
        executions.sort_by(|a, b| a.name.cmp(&b.name));
        let snapshot = Snapshot {
            executions,
            notifications: self.notifications.lock().await.clone(),
        };

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?).await?;
        tokio::fs::rename(&tmp, path).await?;
        tracing::debug!(path = %path.display(), executions = snapshot.executions.len(), "Saved execution snapshot");
        Ok(())
    }

    /// Insert or replace one target configuration.
    pub async fn upsert_configuration(&self, target: TargetConfiguration) {
        self.configurations.write().await.insert(target.id, target);
    }

    /// Replace the configured targets. Returns the ids whose address changed
    /// or that were removed, so their cached endpoints can be evicted.
    pub async fn sync_configurations(&self, targets: Vec<TargetConfiguration>) -> Vec<TargetId> {
        let mut current = self.configurations.write().await;
        let mut next: BTreeMap<TargetId, TargetConfiguration> =
            targets.into_iter().map(|t| (t.id, t)).collect();

        let stale = current
            .iter()
            .filter(|(id, old)| next.get(id).map_or(true, |new| new.uri != old.uri))
            .map(|(id, _)| *id)
            .collect();

        std::mem::swap(&mut *current, &mut next);
        stale
    }

    /// All execution records, ordered by name.
    pub fn executions(&self) -> Vec<ExecutionRecord> {
        let mut all: Vec<_> = self.executions.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// All notification records, oldest first.
    pub async fn notifications(&self) -> Vec<NotificationRecord> {
        self.notifications.lock().await.clone()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list_configurations(&self) -> StoreResult<Vec<TargetConfiguration>> {
        Ok(self.configurations.read().await.values().cloned().collect())
    }

    async fn get_execution(&self, name: &str) -> StoreResult<Option<ExecutionRecord>> {
        Ok(self.executions.get(name).map(|r| r.value().clone()))
    }

    async fn commit_execution(&self, update: &ExecutionUpdate) -> StoreResult<()> {
        match self.executions.entry(update.record.name.clone()) {
            Entry::Occupied(_) if update.created => Err(StoreError::Conflict(format!(
                "execution '{}' already exists",
                update.record.name
            ))),
            Entry::Vacant(_) if !update.created => Err(StoreError::Conflict(format!(
                "execution '{}' was removed concurrently",
                update.record.name
            ))),
            Entry::Occupied(mut slot) => {
                slot.insert(update.record.clone());
                Ok(())
            }
            Entry::Vacant(slot) => {
                slot.insert(update.record.clone());
                Ok(())
            }
        }
    }

    async fn latest_notifications(&self, name: &str, limit: usize) -> StoreResult<Vec<NotificationRecord>> {
        let notifications = self.notifications.lock().await;
        let mut matching: Vec<_> = notifications.iter().filter(|n| n.name == name).cloned().collect();
        matching.sort_by(|a, b| {
            b.last_notified
                .cmp(&a.last_notified)
                .then_with(|| b.id.cmp(&a.id))
        });
        matching.truncate(limit);
        Ok(matching)
    }

    async fn add_notification(&self, mut record: NotificationRecord) -> StoreResult<NotificationRecord> {
        record.id = self.next_notification_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.notifications.lock().await.push(record.clone());
        Ok(record)
    }

    async fn flush(&self) -> StoreResult<()> {
        self.save_snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::HealthStatus;
    use chrono::{TimeZone, Utc};

    fn record(name: &str) -> ExecutionRecord {
        let now = Utc::now();
        ExecutionRecord {
            name: name.to_string(),
            status: HealthStatus::Healthy,
            uri: "/health".into(),
            discovery_service: None,
            last_executed: now,
            on_state_from: now,
            entries: Vec::new(),
            history: Vec::new(),
        }
    }

    fn update(record: ExecutionRecord, created: bool) -> ExecutionUpdate {
        ExecutionUpdate {
            record,
            created,
            removed_entries: Vec::new(),
            appended_history: Vec::new(),
            uri_changed: false,
        }
    }

    #[tokio::test]
    async fn test_commit_and_get() {
        let store = InMemoryStore::new();
        store.commit_execution(&update(record("api"), true)).await.unwrap();
        let loaded = store.get_execution("api").await.unwrap().unwrap();
        assert_eq!(loaded.name, "api");
        assert!(store.get_execution("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let store = InMemoryStore::new();
        store.commit_execution(&update(record("api"), true)).await.unwrap();
        let err = store.commit_execution(&update(record("api"), true)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.executions().len(), 1);
    }

    #[tokio::test]
    async fn test_latest_notifications_order_and_tie_break() {
        let store = InMemoryStore::new();
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        store.add_notification(NotificationRecord::new("api", false, at)).await.unwrap();
        store.add_notification(NotificationRecord::new("api", true, at)).await.unwrap();
        store.add_notification(NotificationRecord::new("other", false, at)).await.unwrap();
        store
            .add_notification(NotificationRecord::new("api", false, at - chrono::Duration::minutes(5)))
            .await
            .unwrap();

        let latest = store.latest_notifications("api", 2).await.unwrap();
        assert_eq!(latest.len(), 2);
        // Same timestamp: the later insertion comes first.
        assert_eq!(latest[0].id, 2);
        assert!(latest[0].is_up_and_running);
        assert_eq!(latest[1].id, 1);
    }

    #[tokio::test]
    async fn test_sync_configurations_reports_stale_ids() {
        let store = InMemoryStore::new();
        store
            .sync_configurations(vec![
                TargetConfiguration::new(1, "a", "/a"),
                TargetConfiguration::new(2, "b", "/b"),
                TargetConfiguration::new(3, "c", "/c"),
            ])
            .await;

        let stale = store
            .sync_configurations(vec![
                TargetConfiguration::new(1, "a", "/a"),
                TargetConfiguration::new(2, "b", "/b2"),
            ])
            .await;
        assert_eq!(stale, vec![TargetId(2), TargetId(3)]);

        let ids: Vec<_> = store.list_configurations().await.unwrap().iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_flushes_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("executions.json");
        let store = InMemoryStore::open_snapshot(&path).await.unwrap();
        store.commit_execution(&update(record("api"), true)).await.unwrap();

        let flushes: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.flush().await })
            })
            .collect();
        for flush in flushes {
            flush.await.unwrap().unwrap();
        }

        let written: Snapshot = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written.executions.len(), 1);
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("executions.json");

        let store = InMemoryStore::open_snapshot(&path).await.unwrap();
        store.commit_execution(&update(record("api"), true)).await.unwrap();
        store
            .add_notification(NotificationRecord::new("api", false, Utc::now()))
            .await
            .unwrap();
        store.save_snapshot().await.unwrap();

        let reopened = InMemoryStore::open_snapshot(&path).await.unwrap();
        assert_eq!(reopened.executions(), store.executions());
        let added = reopened
            .add_notification(NotificationRecord::new("api", true, Utc::now()))
            .await
            .unwrap();
        assert_eq!(added.id, 2);
    }
}
