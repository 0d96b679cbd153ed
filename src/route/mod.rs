//! Client-side routing: topology, strategies, snapshots and the table
//!
//! Everything the RPC call path needs to answer "which host serves this
//! API, and which one do I pick for this call":
//!
//! - [`host`]: the [`Host`] identity value type
//! - [`info`]: [`RouteInfo`] topology records and [`ProtocolFeatures`]
//! - [`strategy`]: [`Router`] selection strategies and their factory
//! - [`snapshot`]: the immutable [`RouteSnapshot`] bundle
//! - [`table`]: the hot-swappable [`RouteTable`]

pub mod host;
pub mod info;
pub mod snapshot;
pub mod strategy;
pub mod table;

pub use host::Host;
pub use info::{ApiInfo, ProtocolFeatures, RouteInfo, DEFAULT_WEIGHT};
pub use snapshot::RouteSnapshot;
pub use strategy::{
    ConfiguredRouterFactory, Router, RouterFactory, StrategyKind, WeightedRandomRouter,
    WeightedRoundRobinRouter, WeightedServer,
};
pub use table::RouteTable;
