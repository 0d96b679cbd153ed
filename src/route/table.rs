//! Hot-swappable routing table
//!
//! Process-wide routing state for the RPC client: the current
//! [`RouteSnapshot`] behind an `ArcSwap`, queried on every outbound call
//! and replaced wholesale on every discovery-driven refresh.
//!
//! # Architecture
//!
//! ```text
//! Call path  -> RouteTable::router_for() -> ArcSwap::load() -> RouteSnapshot
//!                                                |
//!                                         (lock-free read)
//!
//! Discovery  -> RouteTable::refresh() --> build snapshot -> ArcSwap::store()
//!                     |                                          |
//!              (writer mutex)                             (atomic swap)
//!                     |
//!               reconcile sessions (drain departed idle hosts)
//! ```
//!
//! Readers never block and never observe a torn snapshot: a lookup sees
//! either the previous snapshot or the next fully constructed one,
//! never a mix. A reader that started before a refresh may still be
//! routing on the old view; stale-by-one-refresh decisions are
//! acceptable because load balancing is approximate by nature.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use rpc_router::route::{
//!     ApiInfo, ConfiguredRouterFactory, Host, ProtocolFeatures, RouteInfo, RouteTable,
//! };
//!
//! let table = RouteTable::new(Arc::new(ConfiguredRouterFactory::default()));
//! assert_eq!(table.route_count(), 0);
//!
//! let host = Host::new("10.0.0.1", 9527);
//! let mut topology = HashMap::new();
//! topology.insert(
//!     host.clone(),
//!     RouteInfo::new(host.clone(), 50, ProtocolFeatures::NONE, vec![
//!         ApiInfo::new("order.create"),
//!     ]),
//! );
//! table.refresh(topology);
//!
//! let router = table.router_for("order.create").unwrap();
//! assert_eq!(router.select().unwrap(), host);
//! assert!(table.router_for("order.cancel").is_none());
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use parking_lot::Mutex;
use tracing::{debug, info, trace};

use super::host::Host;
use super::info::{ProtocolFeatures, RouteInfo};
use super::snapshot::RouteSnapshot;
use super::strategy::{Router, RouterFactory};
use crate::session::SessionRegistry;

/// Process-wide routing table with lock-free reads and atomic refresh.
///
/// # Thread Safety
///
/// The table is shared across all caller threads. Queries are lock-free
/// and wait-free; `refresh` is mutually exclusive with other refreshes
/// but never blocks readers: the only shared mutable state is the
/// snapshot reference, which is replaced wholesale, never mutated in
/// place.
pub struct RouteTable {
    /// Current snapshot (lock-free reads via `ArcSwap`)
    current: ArcSwap<RouteSnapshot>,

    /// Serializes refreshes; a short, bounded critical section with no I/O
    refresh_lock: Mutex<()>,

    /// Strategy construction, invoked per API per refresh
    factory: Arc<dyn RouterFactory>,

    /// Per-host sessions reconciled against each new snapshot
    sessions: Arc<SessionRegistry>,
}

impl RouteTable {
    /// Create a table holding the empty snapshot and a fresh session
    /// registry.
    #[must_use]
    pub fn new(factory: Arc<dyn RouterFactory>) -> Self {
        Self::with_registry(factory, Arc::new(SessionRegistry::new()))
    }

    /// Create a table sharing an existing session registry.
    ///
    /// The call path inserts sessions into the same registry the table
    /// reconciles, so both sides are normally handed one shared
    /// `Arc<SessionRegistry>`.
    #[must_use]
    pub fn with_registry(factory: Arc<dyn RouterFactory>, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            current: ArcSwap::from_pointee(RouteSnapshot::empty()),
            refresh_lock: Mutex::new(()),
            factory,
            sessions,
        }
    }

    /// Get the current snapshot (lock-free read).
    ///
    /// The returned guard keeps the snapshot alive for its lifetime.
    /// Use it when several queries must observe one consistent view.
    pub fn snapshot(&self) -> Guard<Arc<RouteSnapshot>> {
        self.current.load()
    }

    /// Get a copy of the current raw topology, for diagnostics and ops
    /// tooling. No side effects.
    #[must_use]
    pub fn current_topology(&self) -> HashMap<Host, RouteInfo> {
        self.current.load().topology().clone()
    }

    /// Get the set of all hosts known to the current snapshot.
    #[must_use]
    pub fn servers(&self) -> HashSet<Host> {
        self.current.load().hosts()
    }

    /// Get a host's wire capabilities, or the empty set if the host is
    /// unknown. Never fails.
    #[must_use]
    pub fn protocol_features_of(&self, host: &Host) -> ProtocolFeatures {
        self.current.load().features_of(host)
    }

    /// Get the router for an API.
    ///
    /// `None` means "no reachable server for this API"; callers fail
    /// the RPC with a service-unavailable outcome rather than treating
    /// this as a table error.
    #[must_use]
    pub fn router_for(&self, api: &str) -> Option<Arc<dyn Router>> {
        self.current.load().router(api).map(Arc::clone)
    }

    /// Number of APIs with an active router, for health reporting.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.current.load().route_count()
    }

    /// Get the session registry this table reconciles.
    #[must_use]
    pub const fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Replace the whole topology with a new discovery snapshot.
    ///
    /// The input is a complete replacement, not a delta. A fresh
    /// [`RouteSnapshot`] is built off to the side (per-API strategy
    /// failures and malformed weights degrade locally, never abort the
    /// refresh), published with one atomic store, and then the session
    /// registry is reconciled against the newly published host set.
    ///
    /// Concurrent refreshes are serialized; readers are never blocked.
    /// Any query that starts after this method returns observes the new
    /// snapshot.
    pub fn refresh(&self, topology: HashMap<Host, RouteInfo>) {
        let _guard = self.refresh_lock.lock();

        let snapshot = Arc::new(RouteSnapshot::build(topology, self.factory.as_ref()));

        if tracing::enabled!(tracing::Level::TRACE) {
            let mut hosts: Vec<String> =
                snapshot.hosts().iter().map(ToString::to_string).collect();
            hosts.sort();
            trace!("Service topology: {}", hosts.join(" "));
        }

        info!(
            hosts = snapshot.host_count(),
            routes = snapshot.route_count(),
            "Routing table refreshed"
        );

        self.current.store(Arc::clone(&snapshot));
        self.reconcile_sessions(&snapshot);
    }

    /// Drop sessions for hosts that left the topology.
    ///
    /// Runs on the refresh thread against a point-in-time copy of the
    /// registry while call-path threads may be inserting. For each
    /// departed host: a busy session is left untouched (the next
    /// refresh will look again); an idle one is removed (only if still
    /// the same session) and handed a deferred close. Hosts still in
    /// the topology are never touched.
    fn reconcile_sessions(&self, snapshot: &RouteSnapshot) {
        for (host, session) in self.sessions.view() {
            if snapshot.contains_host(&host) {
                continue;
            }

            if !session.is_idle() {
                debug!("Session for departed host {host} is busy; deferring eviction");
                continue;
            }

            if self.sessions.remove_if_same(&host, &session) {
                debug!("Draining session for departed host {host}");
                session.close_on_flush();
            }
        }
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.current.load();
        f.debug_struct("RouteTable")
            .field("hosts", &snapshot.host_count())
            .field("routes", &snapshot.route_count())
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::info::ApiInfo;
    use crate::route::strategy::ConfiguredRouterFactory;
    use crate::session::{Session, SessionState};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct TestSession {
        idle: AtomicBool,
        closes: AtomicUsize,
    }

    impl TestSession {
        fn new(idle: bool) -> Arc<Self> {
            Arc::new(Self {
                idle: AtomicBool::new(idle),
                closes: AtomicUsize::new(0),
            })
        }

        fn set_idle(&self, idle: bool) {
            self.idle.store(idle, Ordering::SeqCst);
        }

        fn close_count(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    impl Session for TestSession {
        fn state(&self) -> SessionState {
            if self.close_count() > 0 {
                SessionState::Draining
            } else {
                SessionState::Active
            }
        }

        fn is_idle(&self) -> bool {
            self.idle.load(Ordering::SeqCst)
        }

        fn close_on_flush(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn table() -> RouteTable {
        RouteTable::new(Arc::new(ConfiguredRouterFactory::default()))
    }

    fn host(addr: &str) -> Host {
        Host::new(addr, 9527)
    }

    fn topology(entries: &[(&str, i32, &[&str])]) -> HashMap<Host, RouteInfo> {
        entries
            .iter()
            .map(|(addr, weight, apis)| {
                let h = host(addr);
                (
                    h.clone(),
                    RouteInfo::new(
                        h,
                        *weight,
                        ProtocolFeatures::NONE,
                        apis.iter().map(|a| ApiInfo::new(*a)).collect(),
                    ),
                )
            })
            .collect()
    }

    #[test]
    fn test_starts_empty() {
        let table = table();
        assert!(table.servers().is_empty());
        assert_eq!(table.route_count(), 0);
        assert!(table.router_for("anything").is_none());
        assert!(table.current_topology().is_empty());
    }

    #[test]
    fn test_refresh_publishes_routes() {
        let table = table();
        table.refresh(topology(&[
            ("10.0.0.1", 50, &["echo", "order.create"]),
            ("10.0.0.2", 50, &["echo"]),
        ]));

        assert_eq!(table.servers().len(), 2);
        assert_eq!(table.route_count(), 2);

        let echo = table.router_for("echo").unwrap();
        assert_eq!(echo.servers().len(), 2);
        assert!(table.router_for("missing").is_none());
    }

    #[test]
    fn test_refresh_replaces_wholesale() {
        let table = table();
        table.refresh(topology(&[("10.0.0.1", 50, &["echo"])]));
        table.refresh(topology(&[("10.0.0.2", 50, &["ping"])]));

        assert_eq!(table.servers(), HashSet::from([host("10.0.0.2")]));
        assert!(table.router_for("echo").is_none());
        assert!(table.router_for("ping").is_some());
    }

    #[test]
    fn test_unknown_host_features_default() {
        let table = table();
        assert_eq!(
            table.protocol_features_of(&host("10.9.9.9")),
            ProtocolFeatures::NONE
        );
    }

    #[test]
    fn test_reconcile_evicts_idle_departed_session() {
        let table = table();
        table.refresh(topology(&[("10.0.0.1", 50, &["echo"])]));

        let session = TestSession::new(true);
        table
            .sessions()
            .insert(host("10.0.0.1"), session.clone() as Arc<dyn Session>);

        // Host disappears from the topology
        table.refresh(topology(&[("10.0.0.2", 50, &["echo"])]));

        assert!(!table.sessions().contains(&host("10.0.0.1")));
        assert_eq!(session.close_count(), 1);
    }

    #[test]
    fn test_reconcile_spares_busy_session() {
        let table = table();
        table.refresh(topology(&[("10.0.0.1", 50, &["echo"])]));

        let session = TestSession::new(false);
        table
            .sessions()
            .insert(host("10.0.0.1"), session.clone() as Arc<dyn Session>);

        table.refresh(topology(&[]));

        // Busy: still registered, no close issued
        assert!(table.sessions().contains(&host("10.0.0.1")));
        assert_eq!(session.close_count(), 0);

        // Once idle, the next reconciliation pass evicts it
        session.set_idle(true);
        table.refresh(topology(&[]));
        assert!(!table.sessions().contains(&host("10.0.0.1")));
        assert_eq!(session.close_count(), 1);
    }

    #[test]
    fn test_reconcile_spares_hosts_still_in_topology() {
        let table = table();
        let session = TestSession::new(true);
        table
            .sessions()
            .insert(host("10.0.0.1"), session.clone() as Arc<dyn Session>);

        table.refresh(topology(&[("10.0.0.1", 50, &["echo"])]));

        assert!(table.sessions().contains(&host("10.0.0.1")));
        assert_eq!(session.close_count(), 0);
    }

    #[test]
    fn test_snapshot_guard_is_consistent() {
        let table = table();
        table.refresh(topology(&[("10.0.0.1", 50, &["echo"])]));

        let snapshot = table.snapshot();
        table.refresh(topology(&[("10.0.0.2", 50, &["ping"])]));

        // The held guard still sees the old, fully consistent view
        assert!(snapshot.contains_host(&host("10.0.0.1")));
        assert!(snapshot.router("echo").is_some());
        assert!(snapshot.router("ping").is_none());

        // New queries see the new snapshot
        assert!(table.router_for("ping").is_some());
    }
}
