//! Session registry
//!
//! Maps each host to its live session. The call path inserts on cache
//! miss (first call to a host with no existing session); topology
//! reconciliation iterates and removes on the refresh thread. Both
//! sides run concurrently, so the registry is backed by a concurrent
//! map rather than a lock around a plain one.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::traits::Session;
use crate::route::Host;

/// Concurrent host-to-session mapping.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use rpc_router::route::Host;
/// use rpc_router::session::{Session, SessionRegistry, SessionState};
///
/// struct StubSession;
/// impl Session for StubSession {
///     fn state(&self) -> SessionState { SessionState::Active }
///     fn is_idle(&self) -> bool { true }
///     fn close_on_flush(&self) {}
/// }
///
/// let registry = SessionRegistry::new();
/// let host = Host::new("10.0.0.1", 9527);
///
/// let session = registry.get_or_insert_with(host.clone(), || Arc::new(StubSession));
/// assert!(registry.contains(&host));
/// assert!(Arc::ptr_eq(&registry.get(&host).unwrap(), &session));
/// ```
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<Host, Arc<dyn Session>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Insert a session for a host, returning the previous one if any.
    pub fn insert(&self, host: Host, session: Arc<dyn Session>) -> Option<Arc<dyn Session>> {
        debug!("Registering session for {host}");
        self.sessions.insert(host, session)
    }

    /// Get the session for a host.
    #[must_use]
    pub fn get(&self, host: &Host) -> Option<Arc<dyn Session>> {
        self.sessions.get(host).map(|r| Arc::clone(r.value()))
    }

    /// Get the session for a host, creating one on cache miss.
    ///
    /// This is the call-path entry point: the factory runs at most once
    /// per miss, under the map shard's entry lock, so two racing callers
    /// end up sharing one session.
    pub fn get_or_insert_with<F>(&self, host: Host, create: F) -> Arc<dyn Session>
    where
        F: FnOnce() -> Arc<dyn Session>,
    {
        Arc::clone(
            self.sessions
                .entry(host)
                .or_insert_with(create)
                .value(),
        )
    }

    /// Remove the session for a host unconditionally.
    pub fn remove(&self, host: &Host) -> Option<Arc<dyn Session>> {
        self.sessions.remove(host).map(|(_, v)| v)
    }

    /// Remove the session for a host only if it is still the given one.
    ///
    /// Reconciliation uses this to avoid evicting a session the call
    /// path re-created between the iteration and the removal: the entry
    /// is dropped only when the registered session is pointer-identical
    /// to the one that was observed idle.
    pub fn remove_if_same(&self, host: &Host, session: &Arc<dyn Session>) -> bool {
        self.sessions
            .remove_if(host, |_, current| Arc::ptr_eq(current, session))
            .is_some()
    }

    /// Check whether a host has a registered session.
    #[must_use]
    pub fn contains(&self, host: &Host) -> bool {
        self.sessions.contains_key(host)
    }

    /// Get all hosts with a registered session.
    #[must_use]
    pub fn hosts(&self) -> Vec<Host> {
        self.sessions.iter().map(|r| r.key().clone()).collect()
    }

    /// Get a point-in-time copy of the whole registry.
    ///
    /// Used by reconciliation, which must iterate a stable view while
    /// call-path threads keep inserting.
    #[must_use]
    pub fn view(&self) -> Vec<(Host, Arc<dyn Session>)> {
        self.sessions
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect()
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check whether no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("count", &self.len())
            .field("hosts", &self.hosts())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::traits::SessionState;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubSession;

    impl Session for StubSession {
        fn state(&self) -> SessionState {
            SessionState::Active
        }

        fn is_idle(&self) -> bool {
            true
        }

        fn close_on_flush(&self) {}
    }

    fn host(addr: &str) -> Host {
        Host::new(addr, 9527)
    }

    #[test]
    fn test_insert_and_get() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty());

        let session: Arc<dyn Session> = Arc::new(StubSession);
        assert!(registry.insert(host("a"), Arc::clone(&session)).is_none());

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&host("a")));
        assert!(Arc::ptr_eq(&registry.get(&host("a")).unwrap(), &session));
        assert!(registry.get(&host("b")).is_none());
    }

    #[test]
    fn test_get_or_insert_with_runs_factory_once() {
        let registry = SessionRegistry::new();
        let created = AtomicUsize::new(0);

        let make = || -> Arc<dyn Session> {
            created.fetch_add(1, Ordering::SeqCst);
            Arc::new(StubSession)
        };

        let first = registry.get_or_insert_with(host("a"), make);
        let second = registry.get_or_insert_with(host("a"), make);

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_remove_if_same_checks_identity() {
        let registry = SessionRegistry::new();
        let original: Arc<dyn Session> = Arc::new(StubSession);
        let replacement: Arc<dyn Session> = Arc::new(StubSession);

        registry.insert(host("a"), Arc::clone(&original));

        // A different session does not match even for the same host
        assert!(!registry.remove_if_same(&host("a"), &replacement));
        assert!(registry.contains(&host("a")));

        assert!(registry.remove_if_same(&host("a"), &original));
        assert!(!registry.contains(&host("a")));

        // Already gone
        assert!(!registry.remove_if_same(&host("a"), &original));
    }

    #[test]
    fn test_view_is_point_in_time() {
        let registry = SessionRegistry::new();
        registry.insert(host("a"), Arc::new(StubSession));
        registry.insert(host("b"), Arc::new(StubSession));

        let view = registry.view();
        assert_eq!(view.len(), 2);

        // Mutations after the copy do not affect it
        registry.remove(&host("a"));
        assert_eq!(view.len(), 2);
        assert_eq!(registry.len(), 1);
    }
}
