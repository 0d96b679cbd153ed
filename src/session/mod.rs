//! Per-host session lifecycle and registry
//!
//! The call path opens one session per remote host and reuses it across
//! calls. This module owns the shared registry of those sessions and
//! the lifecycle contract the routing table relies on during topology
//! reconciliation: sessions for departed hosts are drained and released
//! only once idle, never aborted mid-flight.
//!
//! # Submodules
//!
//! - [`traits`]: the [`Session`] contract and two-phase close lifecycle
//! - [`registry`]: concurrent host-to-session mapping

pub mod registry;
pub mod traits;

pub use registry::SessionRegistry;
pub use traits::{Session, SessionState};
