//! Session lifecycle contract
//!
//! A session is the per-host client-side connection object owned
//! jointly by the call path (which creates it on first use and drives
//! I/O over it) and the [`SessionRegistry`](super::SessionRegistry)
//! (which evicts it when its host leaves the topology).
//!
//! Closing is a two-phase "close on flush": [`Session::close_on_flush`]
//! moves the session into [`SessionState::Draining`] (no new work is
//! accepted, in-flight I/O is allowed to finish) and the session
//! releases its underlying connection on its own once the flush
//! completes. There is no immediate-abort close in this contract.

use std::fmt;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Open and accepting work
    Active,

    /// Deferred close issued: no new work, in-flight I/O finishing
    Draining,

    /// Flush complete, underlying connection released
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Draining => write!(f, "draining"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Per-host client-side session.
///
/// Implementations live in the transport layer; the routing table only
/// consults the idle flag and issues deferred closes during topology
/// reconciliation.
///
/// # Contract
///
/// - All methods are called concurrently from caller threads and the
///   refresh thread; implementations must be `Send + Sync`.
/// - `close_on_flush` must not block: it flips the session to
///   [`SessionState::Draining`] and returns. The drain/release timing
///   is owned by the session itself.
/// - `close_on_flush` may be called more than once; calls after the
///   first are no-ops.
pub trait Session: Send + Sync {
    /// Current lifecycle state.
    fn state(&self) -> SessionState;

    /// Whether the session has no in-flight work.
    ///
    /// Reconciliation only evicts idle sessions; a busy session stays
    /// registered until a later pass finds it idle.
    fn is_idle(&self) -> bool;

    /// Issue a deferred close: stop accepting new work, let buffered
    /// output flush, then release the underlying connection.
    fn close_on_flush(&self);
}
