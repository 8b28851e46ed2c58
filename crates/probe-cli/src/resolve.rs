//! Forward and reverse name resolution.

use hickory_resolver::TokioAsyncResolver;
use probe_core::ProbeError;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use tracing::{debug, warn};

/// DNS resolver with a cache of reverse lookups.
pub struct Resolver {
    inner: Option<TokioAsyncResolver>,
    names: HashMap<Ipv4Addr, String>,
}

impl Resolver {
    /// Builds a resolver from the system configuration.
    ///
    /// If that fails, literal addresses still resolve and reverse lookups
    /// fall back to the numeric form.
    pub fn from_system_conf() -> Self {
        let inner = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("Failed to create DNS resolver: {}", e);
                None
            }
        };

        Self {
            inner,
            names: HashMap::new(),
        }
    }

    /// Resolves `hostname` to an IPv4 address.
    pub async fn lookup_ipv4(&self, hostname: &str) -> Result<Ipv4Addr, ProbeError> {
        // First check if it's already an IP address
        match hostname.parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) => return Ok(ip),
            Ok(IpAddr::V6(_)) => {
                return Err(ProbeError::NoIpv4Address {
                    hostname: hostname.to_string(),
                })
            }
            Err(_) => {}
        }

        let resolver = self.inner.as_ref().ok_or_else(|| ProbeError::HostNotFound {
            hostname: hostname.to_string(),
            reason: "no DNS resolver available".to_string(),
        })?;

        let lookup = resolver
            .lookup_ip(hostname)
            .await
            .map_err(|e| ProbeError::HostNotFound {
                hostname: hostname.to_string(),
                reason: e.to_string(),
            })?;

        let ip = lookup
            .iter()
            .find_map(|ip| match ip {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .ok_or_else(|| ProbeError::NoIpv4Address {
                hostname: hostname.to_string(),
            })?;

        debug!("Resolved {} to {}", hostname, ip);
        Ok(ip)
    }

    /// Returns the symbolic name of `ip`, or its numeric form if it has none.
    pub async fn reverse_name(&mut self, ip: Ipv4Addr) -> String {
        if let Some(name) = self.names.get(&ip) {
            return name.clone();
        }

        let name = match &self.inner {
            Some(resolver) => match resolver.reverse_lookup(IpAddr::V4(ip)).await {
                Ok(names) => names
                    .iter()
                    .next()
                    .map(|n| n.to_string().trim_end_matches('.').to_string())
                    .unwrap_or_else(|| ip.to_string()),
                Err(e) => {
                    debug!(%ip, error = %e, "Reverse lookup failed");
                    ip.to_string()
                }
            },
            None => ip.to_string(),
        };

        self.names.insert(ip, name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_ip_literal() {
        let resolver = Resolver::from_system_conf();
        let ip = resolver.lookup_ipv4("8.8.8.8").await.unwrap();
        assert_eq!(ip, Ipv4Addr::new(8, 8, 8, 8));
    }

    #[tokio::test]
    async fn test_ipv6_literal_rejected() {
        let resolver = Resolver::from_system_conf();
        let err = resolver.lookup_ipv4("::1").await.unwrap_err();
        assert!(matches!(err, ProbeError::NoIpv4Address { .. }));
    }

    #[tokio::test]
    async fn test_reverse_name_is_cached() {
        let mut resolver = Resolver {
            inner: None,
            names: HashMap::new(),
        };
        let ip = Ipv4Addr::new(192, 0, 2, 7);
        assert_eq!(resolver.reverse_name(ip).await, "192.0.2.7");

        resolver.names.insert(ip, "gateway.example".to_string());
        assert_eq!(resolver.reverse_name(ip).await, "gateway.example");
    }

    #[tokio::test]
    async fn test_lookup_without_resolver_fails() {
        let resolver = Resolver {
            inner: None,
            names: HashMap::new(),
        };
        let err = resolver.lookup_ipv4("example.invalid").await.unwrap_err();
        assert!(matches!(err, ProbeError::HostNotFound { .. }));
    }
}
