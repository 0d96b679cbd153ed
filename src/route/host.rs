//! Host identity type
//!
//! A [`Host`] is the network identity of one remote service instance:
//! an address plus a port. It is an immutable value type (equality,
//! hashing and ordering are all by value) and is cloned freely between
//! the topology snapshot, the per-API routers and the session registry.
//!
//! The address is kept as a string rather than an `IpAddr` because the
//! discovery collaborator may advertise hostnames as well as raw IPs;
//! the routing table never resolves or connects, it only keys on the
//! advertised identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;

/// Network identity (address + port) of a remote service instance.
///
/// # Example
///
/// ```
/// use rpc_router::route::Host;
///
/// let host = Host::new("10.0.0.1", 9527);
/// assert_eq!(host.address(), "10.0.0.1");
/// assert_eq!(host.port(), 9527);
/// assert_eq!(host.to_string(), "10.0.0.1:9527");
///
/// // Parsed and constructed hosts compare by value
/// let parsed: Host = "10.0.0.1:9527".parse().unwrap();
/// assert_eq!(parsed, host);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Host {
    /// Advertised address (IP or hostname)
    address: String,

    /// Advertised port
    port: u16,
}

impl Host {
    /// Create a new host identity.
    #[must_use]
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Get the advertised address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Get the advertised port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

impl FromStr for Host {
    type Err = RouteError;

    /// Parse a host from `address:port` form.
    ///
    /// The split is on the *last* colon so that bracketless IPv6-ish
    /// inputs with a trailing port still parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, port) = s
            .rsplit_once(':')
            .ok_or_else(|| RouteError::invalid_host(s))?;

        if address.is_empty() {
            return Err(RouteError::invalid_host(s));
        }

        let port: u16 = port.parse().map_err(|_| RouteError::invalid_host(s))?;

        Ok(Self::new(address, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_host_value_semantics() {
        let a = Host::new("10.0.0.1", 9527);
        let b = Host::new("10.0.0.1", 9527);
        let c = Host::new("10.0.0.1", 9528);

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(b);
        set.insert(c);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }

    #[test]
    fn test_host_display() {
        let host = Host::new("rpc-1.internal", 8080);
        assert_eq!(host.to_string(), "rpc-1.internal:8080");
    }

    #[test]
    fn test_host_parse() {
        let host: Host = "192.168.1.5:9527".parse().unwrap();
        assert_eq!(host.address(), "192.168.1.5");
        assert_eq!(host.port(), 9527);

        assert!("no-port".parse::<Host>().is_err());
        assert!(":9527".parse::<Host>().is_err());
        assert!("host:notaport".parse::<Host>().is_err());
        assert!("host:99999".parse::<Host>().is_err());
    }

    #[test]
    fn test_host_ordering() {
        let mut hosts = vec![
            Host::new("b", 1),
            Host::new("a", 2),
            Host::new("a", 1),
        ];
        hosts.sort();
        assert_eq!(hosts[0], Host::new("a", 1));
        assert_eq!(hosts[1], Host::new("a", 2));
        assert_eq!(hosts[2], Host::new("b", 1));
    }
}
