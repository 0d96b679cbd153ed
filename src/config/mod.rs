//! Configuration loading and types
//!
//! Strategy selection for the routing table: a default load-balancing
//! strategy plus per-API overrides, loaded from JSON.

pub mod loader;
pub mod types;

pub use loader::{load_config, load_config_str, load_config_with_env};
pub use types::RoutingConfig;
