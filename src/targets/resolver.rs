//! Endpoint resolution with a shared address cache.
//!
//! # Responsibilities
//! - Turn a configured URI into an absolute health-check URL
//! - Fall back to this host's base address for relative URIs
//! - Cache resolved addresses per target id
//!
//! # Design Decisions
//! - The cache is an explicit object injected into the collector, not global state
//! - DashMap shards locking by key, so overlapping cycles never contend on one lock
//! - Entries are evicted when a target's configured URI changes

use dashmap::DashMap;
use std::sync::Arc;
use url::Url;

use crate::targets::host::HostAddressProvider;
use crate::targets::types::{ResolutionError, TargetConfiguration, TargetId};

/// Process-wide map of target id to resolved address.
#[derive(Debug, Clone, Default)]
pub struct AddressCache {
    inner: Arc<DashMap<TargetId, Url>>,
}

impl AddressCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TargetId) -> Option<Url> {
        self.inner.get(&id).map(|r| r.value().clone())
    }

    pub fn insert(&self, id: TargetId, url: Url) {
        self.inner.insert(id, url);
    }

    /// Remove one entry. Returns true if it was cached.
    pub fn evict(&self, id: TargetId) -> bool {
        self.inner.remove(&id).is_some()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Resolves target configurations to absolute URLs.
#[derive(Clone)]
pub struct EndpointResolver {
    cache: AddressCache,
    host: Arc<dyn HostAddressProvider>,
}

impl EndpointResolver {
    pub fn new(cache: AddressCache, host: Arc<dyn HostAddressProvider>) -> Self {
        Self { cache, host }
    }

    pub fn cache(&self) -> &AddressCache {
        &self.cache
    }

    /// Resolve a target, consulting the cache first.
    pub fn resolve(&self, target: &TargetConfiguration) -> Result<Url, ResolutionError> {
        if let Some(url) = self.cache.get(target.id) {
            return Ok(url);
        }

        let url = match Url::parse(&target.uri) {
            Ok(url) if is_valid_health_check_endpoint(&url) => url,
            _ => self.resolve_relative(target)?,
        };

        tracing::debug!(target_name = %target.name, id = %target.id, url = %url, "Resolved target endpoint");
        self.cache.insert(target.id, url.clone());
        Ok(url)
    }

    /// Drop the cached address of a target.
    pub fn evict(&self, id: TargetId) {
        if self.cache.evict(id) {
            tracing::debug!(id = %id, "Evicted cached endpoint");
        }
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    fn resolve_relative(&self, target: &TargetConfiguration) -> Result<Url, ResolutionError> {
        let error = |reason: String| ResolutionError {
            target: target.name.clone(),
            uri: target.uri.clone(),
            reason,
        };

        let base = self
            .host
            .base_address()
            .ok_or_else(|| error("not an absolute uri and no host address is available".into()))?;
        let joined = base.join(&target.uri).map_err(|e| error(e.to_string()))?;

        if is_valid_health_check_endpoint(&joined) {
            Ok(joined)
        } else {
            Err(error(format!("'{}' is not a valid health check endpoint", joined)))
        }
    }
}

/// An http(s) URL with a host and a path.
pub fn is_valid_health_check_endpoint(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some_and(|h| !h.is_empty())
        && !url.path().is_empty()
}
