//! Immutable routing snapshot
//!
//! A [`RouteSnapshot`] bundles everything one topology refresh produced:
//! the raw per-host topology records, the per-API router table built
//! from them and the per-host wire-capability table. The bundle is
//! internally consistent by construction: the capability map is derived
//! from the same input as the router table, and its key set always
//! equals the topology's key set.
//!
//! Snapshots are never mutated. The routing table replaces the whole
//! snapshot on refresh; old snapshots are dropped once the last reader
//! releases them.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::host::Host;
use super::info::{ProtocolFeatures, RouteInfo};
use super::strategy::{Router, RouterFactory, WeightedServer};

/// Immutable, internally consistent bundle of topology, routers and
/// wire capabilities.
///
/// # Example
///
/// ```
/// use rpc_router::route::{
///     ApiInfo, ConfiguredRouterFactory, Host, ProtocolFeatures, RouteInfo, RouteSnapshot,
/// };
/// use std::collections::HashMap;
///
/// let host = Host::new("10.0.0.1", 9527);
/// let mut topology = HashMap::new();
/// topology.insert(
///     host.clone(),
///     RouteInfo::new(host.clone(), 50, ProtocolFeatures::JSON, vec![
///         ApiInfo::new("order.create"),
///     ]),
/// );
///
/// let factory = ConfiguredRouterFactory::default();
/// let snapshot = RouteSnapshot::build(topology, &factory);
///
/// assert_eq!(snapshot.route_count(), 1);
/// assert!(snapshot.router("order.create").is_some());
/// assert_eq!(snapshot.features_of(&host), ProtocolFeatures::JSON);
/// ```
pub struct RouteSnapshot {
    /// Raw topology records keyed by host
    topology: HashMap<Host, RouteInfo>,

    /// Per-API routers; only APIs with at least one valid weighted
    /// server and a successfully constructed strategy appear here
    routers: HashMap<String, Arc<dyn Router>>,

    /// Per-host wire capabilities, derived from `topology`
    features: HashMap<Host, ProtocolFeatures>,
}

impl RouteSnapshot {
    /// Create the empty snapshot (no hosts, no routes, no capabilities).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            topology: HashMap::new(),
            routers: HashMap::new(),
            features: HashMap::new(),
        }
    }

    /// Build a snapshot from a full topology replacement.
    ///
    /// For every advertised API, the contributing hosts are folded into
    /// a weighted server set (deduplicated by host identity, last write
    /// wins on weight; hosts are folded in ascending order so the merge
    /// is deterministic) and handed to the factory. A declined API is
    /// simply left out of the router table; one API's strategy failure
    /// never prevents the rest of the topology from being published.
    #[must_use]
    pub fn build(topology: HashMap<Host, RouteInfo>, factory: &dyn RouterFactory) -> Self {
        let mut by_api: HashMap<String, HashSet<WeightedServer>> = HashMap::new();

        let mut hosts: Vec<&Host> = topology.keys().collect();
        hosts.sort();

        for host in hosts {
            let info = &topology[host];
            let weight = info.effective_weight();
            for api in info.apis() {
                by_api
                    .entry(api.name().to_owned())
                    .or_default()
                    .replace(WeightedServer::new(info.host().clone(), weight));
            }
        }

        let mut routers: HashMap<String, Arc<dyn Router>> = HashMap::new();
        for (api, servers) in by_api {
            let mut servers: Vec<WeightedServer> = servers.into_iter().collect();
            servers.sort_by(|a, b| a.host().cmp(b.host()));

            match factory.create_router(&api, &servers) {
                Some(router) => {
                    routers.insert(api, router);
                }
                None => {
                    debug!("No usable strategy for {api}; API left unroutable");
                }
            }
        }

        let features = topology
            .iter()
            .map(|(host, info)| (host.clone(), info.features()))
            .collect();

        Self {
            topology,
            routers,
            features,
        }
    }

    /// Get the raw topology records.
    #[must_use]
    pub const fn topology(&self) -> &HashMap<Host, RouteInfo> {
        &self.topology
    }

    /// Get the router for an API, if one exists.
    #[must_use]
    pub fn router(&self, api: &str) -> Option<&Arc<dyn Router>> {
        self.routers.get(api)
    }

    /// Get a host's wire capabilities, or the empty set if unknown.
    #[must_use]
    pub fn features_of(&self, host: &Host) -> ProtocolFeatures {
        self.features.get(host).copied().unwrap_or_default()
    }

    /// Check whether a host is part of this snapshot.
    #[must_use]
    pub fn contains_host(&self, host: &Host) -> bool {
        self.topology.contains_key(host)
    }

    /// Get the set of all hosts known to this snapshot.
    #[must_use]
    pub fn hosts(&self) -> HashSet<Host> {
        self.topology.keys().cloned().collect()
    }

    /// Number of APIs with an active router.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routers.len()
    }

    /// Number of hosts in the topology.
    #[must_use]
    pub fn host_count(&self) -> usize {
        self.topology.len()
    }

    /// Check whether the snapshot holds no hosts at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topology.is_empty()
    }
}

impl fmt::Debug for RouteSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSnapshot")
            .field("hosts", &self.host_count())
            .field("routes", &self.route_count())
            .finish()
    }
}
