//! rpc-router: Client-side RPC routing and load balancing
//!
//! This crate turns dynamically discovered service topology into a
//! queryable, per-API routing structure consulted on every outbound
//! remote call, and manages the lifecycle of per-host sessions as the
//! topology changes.
//!
//! # Features
//!
//! - **Atomic topology snapshots**: every refresh builds a fresh,
//!   immutable [`RouteSnapshot`](route::RouteSnapshot) and publishes it
//!   with one atomic swap, so readers are lock-free and never observe a
//!   torn view
//! - **Pluggable load balancing**: per-API
//!   [`Router`](route::Router) strategies (weighted random, weighted
//!   round-robin) constructed by a configurable factory
//! - **Graceful session reconciliation**: sessions for hosts that left
//!   the topology are drained ("close on flush") once idle, never
//!   aborted mid-flight
//!
//! # Architecture
//!
//! ```text
//! Discovery ──refresh(topology)──> RouteTable ──store──> RouteSnapshot
//!                                      │                 (Host→RouteInfo,
//!                                      │                  API→Router,
//!                              reconcile sessions         Host→features)
//!                                      │                       ▲
//!                                      ▼                       │ load
//! SessionRegistry (Host→Session)                Call path: router_for(api)
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use rpc_router::route::{
//!     ApiInfo, ConfiguredRouterFactory, Host, ProtocolFeatures, RouteInfo, RouteTable,
//!     StrategyKind,
//! };
//!
//! // One table per process, shared with every caller thread
//! let table = Arc::new(RouteTable::new(Arc::new(
//!     ConfiguredRouterFactory::new(StrategyKind::WeightedRandom),
//! )));
//!
//! // Discovery hands over a full topology replacement
//! let host = Host::new("10.0.0.1", 9527);
//! let mut topology = HashMap::new();
//! topology.insert(
//!     host.clone(),
//!     RouteInfo::new(host, 100, ProtocolFeatures::JSON, vec![
//!         ApiInfo::new("order.create"),
//!     ]),
//! );
//! table.refresh(topology);
//!
//! // Call path: pick a host for this call
//! match table.router_for("order.create") {
//!     Some(router) => {
//!         let target = router.select().unwrap();
//!         // open/reuse a session to `target` and send the request...
//!         # let _ = target;
//!     }
//!     None => { /* fail the call: no reachable server */ }
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: strategy configuration and loading
//! - [`error`]: error types
//! - [`route`]: hosts, topology records, strategies, snapshots, table
//! - [`session`]: per-host session lifecycle and registry

#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod route;
pub mod session;

pub use error::{ConfigError, Result, RouteError, RpcRouterError, SessionError};
pub use route::{Host, RouteInfo, RouteSnapshot, RouteTable, Router, RouterFactory};
pub use session::{Session, SessionRegistry, SessionState};
