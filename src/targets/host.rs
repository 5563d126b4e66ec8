//! This host's own base address, used to absolutize relative targets.

use url::Url;

/// Source of the address this process listens on.
pub trait HostAddressProvider: Send + Sync {
    /// Base address that relative target URIs are joined onto.
    fn base_address(&self) -> Option<Url>;
}

/// Host address taken from configuration.
#[derive(Debug, Clone)]
pub struct StaticHostAddress {
    base: Option<Url>,
}

impl StaticHostAddress {
    /// Build from a listen address such as `http://*:5000` or
    /// `http://0.0.0.0:8080`. Wildcard hosts are replaced by `localhost`.
    pub fn new(listen_address: &str) -> Self {
        let normalized = normalize_wildcard_host(listen_address.trim());
        let base = match Url::parse(&normalized) {
            Ok(url) if url.has_host() => Some(url),
            Ok(_) | Err(_) => {
                tracing::warn!(
                    listen_address = %listen_address,
                    "Host listen address is not usable, relative targets will not resolve"
                );
                None
            }
        };
        Self { base }
    }

    /// A provider with no address; only absolute targets resolve.
    pub fn none() -> Self {
        Self { base: None }
    }
}

impl HostAddressProvider for StaticHostAddress {
    fn base_address(&self) -> Option<Url> {
        self.base.clone()
    }
}

fn normalize_wildcard_host(address: &str) -> String {
    let Some((scheme, rest)) = address.split_once("://") else {
        return address.to_string();
    };
    let (authority, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    let (host, port) = if let Some(stripped) = authority.strip_prefix("[::]") {
        ("[::]", stripped)
    } else {
        match authority.rfind(':') {
            Some(i) => authority.split_at(i),
            None => (authority, ""),
        }
    };
    let host = match host {
        "*" | "+" | "0.0.0.0" | "[::]" => "localhost",
        other => other,
    };
    format!("{scheme}://{host}{port}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_hosts_become_localhost() {
        for addr in ["http://*:5000", "http://+:5000", "http://0.0.0.0:5000", "http://[::]:5000"] {
            let provider = StaticHostAddress::new(addr);
            let base = provider.base_address().unwrap();
            assert_eq!(base.as_str(), "http://localhost:5000/", "from {addr}");
        }
    }

    #[test]
    fn test_concrete_host_kept() {
        let provider = StaticHostAddress::new("https://monitor.internal:8443/base/");
        let base = provider.base_address().unwrap();
        assert_eq!(base.host_str(), Some("monitor.internal"));
        assert_eq!(base.path(), "/base/");
    }

    #[test]
    fn test_unusable_address() {
        assert!(StaticHostAddress::new("not an address").base_address().is_none());
        assert!(StaticHostAddress::none().base_address().is_none());
    }
}
