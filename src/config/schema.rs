//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.
//! Every section has defaults so a minimal file only lists its targets.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::targets::TargetConfiguration;

/// Root configuration for the collector daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    /// Cycle and notification behaviour.
    pub collector: CollectorConfig,

    /// This host's own address, for relative target URIs.
    pub host: HostConfig,

    /// Execution snapshot persistence.
    pub storage: StorageConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Monitored endpoints.
    pub targets: Vec<TargetEntry>,
}

impl Config {
    /// Configured targets, with missing ids defaulted to position + 1.
    pub fn target_configurations(&self) -> Vec<TargetConfiguration> {
        self.targets
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let id = t.id.unwrap_or(i as u64 + 1);
                let target = TargetConfiguration::new(id, t.name.clone(), t.uri.clone());
                match &t.discovery_service {
                    Some(service) => target.with_discovery_service(service.clone()),
                    None => target,
                }
            })
            .collect()
    }
}

/// Collector settings. Only `notify_unhealthy_once_until_change` is
/// applied on reload; the rest is read at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Seconds between cycle starts.
    pub interval_secs: u64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Suppress repeated down notifications until the state flips.
    pub notify_unhealthy_once_until_change: bool,

    /// Minimum seconds between two notifications of the same state.
    pub min_secs_between_failure_notifications: u64,

    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl CollectorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn min_between_notifications(&self) -> Duration {
        Duration::from_secs(self.min_secs_between_failure_notifications)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            request_timeout_secs: 30,
            notify_unhealthy_once_until_change: false,
            min_secs_between_failure_notifications: 0,
            user_agent: concat!("health-collector/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    /// Base address relative target URIs are joined onto.
    pub listen_address: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            listen_address: "http://localhost:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON snapshot file. Without it the store is memory only.
    pub snapshot_path: Option<PathBuf>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    pub log_level: String,

    /// `pretty` or `json`.
    pub log_format: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// One `[[targets]]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetEntry {
    #[serde(default)]
    pub id: Option<u64>,

    pub name: String,

    /// Absolute URL, or a path relative to `host.listen_address`.
    pub uri: String,

    #[serde(default)]
    pub discovery_service: Option<String>,
}
