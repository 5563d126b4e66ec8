//! Persisted execution state of a target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::report::types::{timespan, HealthStatus, ReportEntry};

/// Latest known state of one target, keyed by target name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub name: String,
    pub status: HealthStatus,
    /// Configured address at the time of the last reconciliation.
    pub uri: String,
    pub discovery_service: Option<String>,
    pub last_executed: DateTime<Utc>,
    /// When the record entered its current status.
    pub on_state_from: DateTime<Utc>,
    pub entries: Vec<ExecutionEntry>,
    /// Append-only log of per-check status changes.
    pub history: Vec<TransitionHistoryEntry>,
}

impl ExecutionRecord {
    pub fn entry(&self, name: &str) -> Option<&ExecutionEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Latest result of one named check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEntry {
    pub name: String,
    pub status: HealthStatus,
    pub description: Option<String>,
    #[serde(with = "timespan")]
    pub duration: Duration,
    pub tags: Vec<String>,
}

impl ExecutionEntry {
    pub fn from_report(name: &str, entry: &ReportEntry) -> Self {
        Self {
            name: name.to_string(),
            status: entry.status,
            description: entry.description.clone(),
            duration: entry.duration,
            tags: entry.tags.clone(),
        }
    }

    /// Overwrite with the values of a newer report entry.
    pub fn apply(&mut self, entry: &ReportEntry) {
        self.status = entry.status;
        self.description = entry.description.clone();
        self.duration = entry.duration;
        self.tags = entry.tags.clone();
    }
}

/// A change of status of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionHistoryEntry {
    pub on: DateTime<Utc>,
    pub name: String,
    pub status: HealthStatus,
    pub description: Option<String>,
}

/// Everything a single target's reconciliation changes, committed as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionUpdate {
    /// The record after reconciliation.
    pub record: ExecutionRecord,
    /// True if no record existed before.
    pub created: bool,
    /// Names of entries dropped because the report no longer contains them.
    pub removed_entries: Vec<String>,
    /// History entries appended by this reconciliation.
    pub appended_history: Vec<TransitionHistoryEntry>,
    /// True if the configured address differed from the stored one.
    pub uri_changed: bool,
}
