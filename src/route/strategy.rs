//! Load-balancing strategies
//!
//! This module defines the per-API selection strategy used on every
//! outbound call:
//!
//! - [`WeightedServer`]: a host paired with its effective weight, scoped
//!   to one API
//! - [`Router`]: the strategy trait, which picks one host per call from its
//!   weighted server set
//! - [`WeightedRandomRouter`] / [`WeightedRoundRobinRouter`]: the
//!   built-in strategies
//! - [`RouterFactory`] / [`ConfiguredRouterFactory`]: pluggable
//!   construction, keyed by API name, driven by configuration
//!
//! Routers are immutable after construction. Each topology refresh
//! builds a fresh router per API; the routing table never mutates a
//! live one.
//!
//! # Example
//!
//! ```
//! use rpc_router::route::{
//!     ConfiguredRouterFactory, Host, RouterFactory, StrategyKind, WeightedServer,
//! };
//!
//! let factory = ConfiguredRouterFactory::new(StrategyKind::RoundRobin);
//! let servers = vec![
//!     WeightedServer::new(Host::new("10.0.0.1", 9527), 100),
//!     WeightedServer::new(Host::new("10.0.0.2", 9527), 100),
//! ];
//!
//! let router = factory.create_router("order.create", &servers).unwrap();
//! let host = router.select().unwrap();
//! assert!(servers.iter().any(|s| s.host() == &host));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::host::Host;

/// A host with a load-balancing weight, scoped to exactly one API.
///
/// # Equality contract
///
/// Equality and hashing are scoped to the **host component only**. A
/// per-API server set therefore collapses duplicate contributions for
/// the same host, and merging is "last write wins on weight": inserting
/// a `WeightedServer` for an already-present host replaces the stored
/// weight.
#[derive(Debug, Clone)]
pub struct WeightedServer {
    host: Host,
    weight: u32,
}

impl WeightedServer {
    /// Create a new weighted server entry.
    #[must_use]
    pub const fn new(host: Host, weight: u32) -> Self {
        Self { host, weight }
    }

    /// Get the host identity.
    #[must_use]
    pub const fn host(&self) -> &Host {
        &self.host
    }

    /// Get the effective weight.
    #[must_use]
    pub const fn weight(&self) -> u32 {
        self.weight
    }
}

impl PartialEq for WeightedServer {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host
    }
}

impl Eq for WeightedServer {}

impl Hash for WeightedServer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.hash(state);
    }
}

impl fmt::Display for WeightedServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(w={})", self.host, self.weight)
    }
}

/// Per-API selection strategy.
///
/// A router owns an immutable weighted server set and picks one host
/// per call. Implementations must be safe to share across caller
/// threads; selection state (cursors, RNG) must be interior and
/// lock-free.
pub trait Router: Send + Sync + fmt::Debug {
    /// Select one host for an outbound call.
    ///
    /// Returns `None` only if the server set is empty, which the
    /// built-in constructors already reject.
    fn select(&self) -> Option<Host>;

    /// Get the selectable weighted server set.
    fn servers(&self) -> &[WeightedServer];
}

/// Identifier of a built-in strategy, selectable via configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Weighted random pick (DEFAULT)
    #[default]
    WeightedRandom,

    /// Weighted round-robin over an atomic cursor
    RoundRobin,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WeightedRandom => write!(f, "weighted_random"),
            Self::RoundRobin => write!(f, "round_robin"),
        }
    }
}

/// Cumulative-weight table shared by the built-in strategies.
///
/// `cumulative[i]` is the sum of weights of `servers[0..=i]`; a tick in
/// `0..total` maps to the first index whose cumulative weight exceeds
/// it, so each server owns a span proportional to its weight.
#[derive(Debug)]
struct WeightTable {
    servers: Vec<WeightedServer>,
    cumulative: Vec<u64>,
    total: u64,
}

impl WeightTable {
    /// Build the table, declining empty or zero-weight server sets.
    fn build(servers: Vec<WeightedServer>) -> Option<Self> {
        if servers.is_empty() {
            return None;
        }

        let mut cumulative = Vec::with_capacity(servers.len());
        let mut total: u64 = 0;
        for server in &servers {
            total += u64::from(server.weight());
            cumulative.push(total);
        }

        if total == 0 {
            return None;
        }

        Some(Self {
            servers,
            cumulative,
            total,
        })
    }

    /// Map a tick in `0..total` to the owning server's host.
    fn host_at(&self, tick: u64) -> Host {
        let index = self.cumulative.partition_point(|&c| c <= tick);
        self.servers[index].host().clone()
    }
}

/// Weighted random selection.
///
/// Every call draws a uniform tick over the total weight; a host is
/// picked with probability proportional to its weight. Stateless apart
/// from the thread-local RNG, so selection never contends.
#[derive(Debug)]
pub struct WeightedRandomRouter {
    table: WeightTable,
}

impl WeightedRandomRouter {
    /// Build a router over the given server set.
    ///
    /// Returns `None` for an empty or zero-total-weight set.
    #[must_use]
    pub fn new(servers: Vec<WeightedServer>) -> Option<Self> {
        WeightTable::build(servers).map(|table| Self { table })
    }
}

impl Router for WeightedRandomRouter {
    fn select(&self) -> Option<Host> {
        let tick = rand::thread_rng().gen_range(0..self.table.total);
        Some(self.table.host_at(tick))
    }

    fn servers(&self) -> &[WeightedServer] {
        &self.table.servers
    }
}

/// Weighted round-robin selection.
///
/// An atomic cursor walks the cumulative-weight table, so over any
/// window of `total_weight` consecutive selections each host is picked
/// exactly `weight` times.
#[derive(Debug)]
pub struct WeightedRoundRobinRouter {
    table: WeightTable,
    cursor: AtomicU64,
}

impl WeightedRoundRobinRouter {
    /// Build a router over the given server set.
    ///
    /// Returns `None` for an empty or zero-total-weight set.
    #[must_use]
    pub fn new(servers: Vec<WeightedServer>) -> Option<Self> {
        WeightTable::build(servers).map(|table| Self {
            table,
            cursor: AtomicU64::new(0),
        })
    }
}

impl Router for WeightedRoundRobinRouter {
    fn select(&self) -> Option<Host> {
        let tick = self.cursor.fetch_add(1, Ordering::Relaxed) % self.table.total;
        Some(self.table.host_at(tick))
    }

    fn servers(&self) -> &[WeightedServer] {
        &self.table.servers
    }
}

/// Pluggable router construction, invoked once per API per refresh.
///
/// Returning `None` declines the API: it is left out of the new route
/// map and lookups for it return "no route" until a later refresh.
/// Declining must never abort the refresh.
pub trait RouterFactory: Send + Sync {
    /// Construct a router for one API from its weighted server set.
    fn create_router(&self, api: &str, servers: &[WeightedServer]) -> Option<Arc<dyn Router>>;
}

/// Configuration-driven factory: a default strategy plus per-API
/// overrides.
///
/// # Example
///
/// ```
/// use rpc_router::route::{ConfiguredRouterFactory, StrategyKind};
///
/// let factory = ConfiguredRouterFactory::new(StrategyKind::WeightedRandom)
///     .with_api_strategy("order.create", StrategyKind::RoundRobin);
///
/// assert_eq!(factory.strategy_for("order.create"), StrategyKind::RoundRobin);
/// assert_eq!(factory.strategy_for("anything.else"), StrategyKind::WeightedRandom);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfiguredRouterFactory {
    default_strategy: StrategyKind,
    api_strategies: HashMap<String, StrategyKind>,
}

impl ConfiguredRouterFactory {
    /// Create a factory with the given default strategy.
    #[must_use]
    pub fn new(default_strategy: StrategyKind) -> Self {
        Self {
            default_strategy,
            api_strategies: HashMap::new(),
        }
    }

    /// Override the strategy for one API.
    #[must_use]
    pub fn with_api_strategy(mut self, api: impl Into<String>, kind: StrategyKind) -> Self {
        self.api_strategies.insert(api.into(), kind);
        self
    }

    /// Get the strategy that will be used for an API.
    #[must_use]
    pub fn strategy_for(&self, api: &str) -> StrategyKind {
        self.api_strategies
            .get(api)
            .copied()
            .unwrap_or(self.default_strategy)
    }
}

impl RouterFactory for ConfiguredRouterFactory {
    fn create_router(&self, api: &str, servers: &[WeightedServer]) -> Option<Arc<dyn Router>> {
        if servers.is_empty() {
            debug!("Declining router for {api}: empty server set");
            return None;
        }

        let kind = self.strategy_for(api);
        let servers = servers.to_vec();

        match kind {
            StrategyKind::WeightedRandom => {
                WeightedRandomRouter::new(servers).map(|r| Arc::new(r) as Arc<dyn Router>)
            }
            StrategyKind::RoundRobin => {
                WeightedRoundRobinRouter::new(servers).map(|r| Arc::new(r) as Arc<dyn Router>)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn server(addr: &str, weight: u32) -> WeightedServer {
        WeightedServer::new(Host::new(addr, 9527), weight)
    }

    #[test]
    fn test_weighted_server_host_only_equality() {
        let a = server("10.0.0.1", 10);
        let b = server("10.0.0.1", 99);
        let c = server("10.0.0.2", 10);

        assert_eq!(a, b);
        assert_ne!(a, c);

        // Last write wins on weight when merging by host identity
        let mut set = HashSet::new();
        set.insert(a);
        set.replace(b);
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().weight(), 99);
    }

    #[test]
    fn test_empty_set_declined() {
        assert!(WeightedRandomRouter::new(vec![]).is_none());
        assert!(WeightedRoundRobinRouter::new(vec![]).is_none());

        let factory = ConfiguredRouterFactory::default();
        assert!(factory.create_router("api", &[]).is_none());
    }

    #[test]
    fn test_zero_total_weight_declined() {
        let servers = vec![server("a", 0), server("b", 0)];
        assert!(WeightedRandomRouter::new(servers.clone()).is_none());
        assert!(WeightedRoundRobinRouter::new(servers).is_none());
    }

    #[test]
    fn test_round_robin_weighted_distribution() {
        let router =
            WeightedRoundRobinRouter::new(vec![server("a", 2), server("b", 1)]).unwrap();

        // One full cycle of total weight 3: a, a, b
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..300 {
            let host = router.select().unwrap();
            *counts.entry(host.address().to_string()).or_default() += 1;
        }

        assert_eq!(counts["a"], 200);
        assert_eq!(counts["b"], 100);
    }

    #[test]
    fn test_random_selection_stays_in_set() {
        let servers = vec![server("a", 1), server("b", 5), server("c", 10)];
        let router = WeightedRandomRouter::new(servers.clone()).unwrap();

        for _ in 0..1000 {
            let host = router.select().unwrap();
            assert!(servers.iter().any(|s| s.host() == &host));
        }
    }

    #[test]
    fn test_random_selection_favors_heavy_weights() {
        let router =
            WeightedRandomRouter::new(vec![server("heavy", 95), server("light", 5)]).unwrap();

        let mut heavy = 0usize;
        for _ in 0..2000 {
            if router.select().unwrap().address() == "heavy" {
                heavy += 1;
            }
        }

        // 95% expected; anything above a clear majority proves the
        // weighting is applied without making the test flaky
        assert!(heavy > 1500, "heavy host selected only {heavy}/2000 times");
    }

    #[test]
    fn test_single_host_always_selected() {
        let only = Host::new("only", 1);
        let router =
            WeightedRandomRouter::new(vec![WeightedServer::new(only.clone(), 100)]).unwrap();

        for _ in 0..20 {
            assert_eq!(router.select().unwrap(), only);
        }
    }

    #[test]
    fn test_factory_per_api_override() {
        let factory = ConfiguredRouterFactory::new(StrategyKind::WeightedRandom)
            .with_api_strategy("pinned", StrategyKind::RoundRobin);

        let servers = vec![server("a", 1)];
        assert!(factory.create_router("pinned", &servers).is_some());
        assert!(factory.create_router("other", &servers).is_some());
        assert_eq!(factory.strategy_for("pinned"), StrategyKind::RoundRobin);
        assert_eq!(factory.strategy_for("other"), StrategyKind::WeightedRandom);
    }

    #[test]
    fn test_strategy_kind_serde() {
        let kind: StrategyKind = serde_json::from_str("\"round_robin\"").unwrap();
        assert_eq!(kind, StrategyKind::RoundRobin);
        assert_eq!(
            serde_json::to_string(&StrategyKind::WeightedRandom).unwrap(),
            "\"weighted_random\""
        );
    }
}
