//! Merging fresh reports into persisted execution records.
//!
//! # Rules
//! ```text
//! no record            → create from report (status, entries, now/now)
//! uri changed          → store new uri, evict cached endpoint
//! same overall status  → only last_executed advances
//! status changed       → history += one entry per existing check whose status changed;
//!                        on_state_from = last_executed = now; status = report.status
//! always               → upsert every reported check; drop checks no longer reported
//! ```
//! The diff is computed by the pure [`reconcile`] function and committed by
//! [`HistoryReconciler`] in one store call.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::history::types::{ExecutionEntry, ExecutionRecord, ExecutionUpdate, TransitionHistoryEntry};
use crate::report::types::HealthReport;
use crate::store::{Store, StoreResult};
use crate::targets::{EndpointResolver, TargetConfiguration};

/// Compute the reconciliation of `report` into `previous`.
pub fn reconcile(
    previous: Option<ExecutionRecord>,
    target: &TargetConfiguration,
    report: &HealthReport,
    now: DateTime<Utc>,
) -> ExecutionUpdate {
    let Some(mut record) = previous else {
        return ExecutionUpdate {
            record: ExecutionRecord {
                name: target.name.clone(),
                status: report.status,
                uri: target.uri.clone(),
                discovery_service: target.discovery_service.clone(),
                last_executed: now,
                on_state_from: now,
                entries: report
                    .entries
                    .iter()
                    .map(|(name, entry)| ExecutionEntry::from_report(name, entry))
                    .collect(),
                history: Vec::new(),
            },
            created: true,
            removed_entries: Vec::new(),
            appended_history: Vec::new(),
            uri_changed: false,
        };
    };

    let uri_changed = record.uri != target.uri;
    if uri_changed {
        record.uri = target.uri.clone();
    }

    let mut appended_history = Vec::new();
    if record.status == report.status {
        record.last_executed = now;
    } else {
        for entry in &record.entries {
            // Checks missing from the report (e.g. the target is down) get no history.
            if let Some(reported) = report.entries.get(&entry.name) {
                if reported.status != entry.status {
                    appended_history.push(TransitionHistoryEntry {
                        on: now,
                        name: entry.name.clone(),
                        status: reported.status,
                        description: reported.description.clone(),
                    });
                }
            }
        }
        record.history.extend(appended_history.iter().cloned());
        record.on_state_from = now;
        record.last_executed = now;
        record.status = report.status;
    }

    for (name, reported) in &report.entries {
        match record.entries.iter_mut().find(|e| &e.name == name) {
            Some(existing) => existing.apply(reported),
            None => record.entries.push(ExecutionEntry::from_report(name, reported)),
        }
    }

    let mut removed_entries = Vec::new();
    record.entries.retain(|e| {
        let keep = report.entries.contains_key(&e.name);
        if !keep {
            removed_entries.push(e.name.clone());
        }
        keep
    });

    ExecutionUpdate {
        record,
        created: false,
        removed_entries,
        appended_history,
        uri_changed,
    }
}

/// Loads, reconciles, and commits execution records.
#[derive(Clone)]
pub struct HistoryReconciler {
    store: Arc<dyn Store>,
    resolver: EndpointResolver,
}

impl HistoryReconciler {
    pub fn new(store: Arc<dyn Store>, resolver: EndpointResolver) -> Self {
        Self { store, resolver }
    }

    /// Merge `report` into the stored record of `target` and commit it.
    pub async fn reconcile_and_save(
        &self,
        target: &TargetConfiguration,
        report: &HealthReport,
        now: DateTime<Utc>,
    ) -> StoreResult<ExecutionUpdate> {
        let previous = self.store.get_execution(&target.name).await?;
        self.apply(previous, target, report, now).await
    }

    /// Like [`HistoryReconciler::reconcile_and_save`], for a caller that
    /// already loaded the previous record.
    pub async fn apply(
        &self,
        previous: Option<ExecutionRecord>,
        target: &TargetConfiguration,
        report: &HealthReport,
        now: DateTime<Utc>,
    ) -> StoreResult<ExecutionUpdate> {
        let update = reconcile(previous, target, report, now);

        if update.uri_changed {
            tracing::info!(target_name = %target.name, uri = %target.uri, "Target address changed");
            self.resolver.evict(target.id);
        }

        if update.created {
            tracing::debug!(target_name = %target.name, "Creating a new execution history");
        } else if !update.appended_history.is_empty() {
            tracing::debug!(
                target_name = %target.name,
                changes = update.appended_history.len(),
                status = %update.record.status,
                "Execution changed state, history appended"
            );
        }
        for removed in &update.removed_entries {
            tracing::debug!(target_name = %target.name, entry = %removed, "Removing entry no longer reported");
        }

        self.store.commit_execution(&update).await?;
        Ok(update)
    }
}
