//! Target identity and configuration types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable identity of a configured target. Cycles process targets in
/// ascending id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub u64);

impl From<u64> for TargetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered health-check endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfiguration {
    pub id: TargetId,
    /// Display name, also the key of the target's execution record.
    pub name: String,
    /// Configured address, absolute or relative to this host.
    pub uri: String,
    /// Discovery source that registered the target, `None` when static.
    #[serde(default)]
    pub discovery_service: Option<String>,
}

impl TargetConfiguration {
    pub fn new(id: impl Into<TargetId>, name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            uri: uri.into(),
            discovery_service: None,
        }
    }

    pub fn with_discovery_service(mut self, source: impl Into<String>) -> Self {
        self.discovery_service = Some(source.into());
        self
    }
}

/// The configured address of a target cannot be made absolute.
#[derive(Debug, Clone, Error)]
#[error("could not get endpoint uri for '{target}' from '{uri}': {reason}")]
pub struct ResolutionError {
    pub target: String,
    pub uri: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_ordering_by_id() {
        let mut targets = vec![
            TargetConfiguration::new(3, "c", "/c"),
            TargetConfiguration::new(1, "a", "/a"),
            TargetConfiguration::new(2, "b", "/b"),
        ];
        targets.sort_by_key(|t| t.id);
        let names: Vec<_> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_resolution_error_display() {
        let err = ResolutionError {
            target: "api".into(),
            uri: "::bad".into(),
            reason: "no base address".into(),
        };
        let text = err.to_string();
        assert!(text.contains("api"));
        assert!(text.contains("::bad"));
    }
}
