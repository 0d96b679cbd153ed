//! Configuration types for rpc-router
//!
//! Routing configuration selects the load-balancing strategy: one
//! default plus optional per-API overrides. Loaded from JSON and
//! validated at startup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::route::{ConfiguredRouterFactory, StrategyKind};

/// Root routing configuration.
///
/// # Example
///
/// ```
/// use rpc_router::config::RoutingConfig;
///
/// let config: RoutingConfig = serde_json::from_str(r#"{
///     "default_strategy": "round_robin",
///     "api_strategies": { "order.create": "weighted_random" }
/// }"#).unwrap();
///
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RoutingConfig {
    /// Strategy used for APIs without an override
    #[serde(default)]
    pub default_strategy: StrategyKind,

    /// Per-API strategy overrides
    #[serde(default)]
    pub api_strategies: HashMap<String, StrategyKind>,
}

impl RoutingConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if an override is keyed
    /// by an empty API name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_strategies.keys().any(String::is_empty) {
            return Err(ConfigError::ValidationError(
                "API strategy override with empty API name".into(),
            ));
        }
        Ok(())
    }

    /// Build the router factory this configuration describes.
    #[must_use]
    pub fn into_factory(self) -> ConfiguredRouterFactory {
        self.api_strategies.into_iter().fold(
            ConfiguredRouterFactory::new(self.default_strategy),
            |factory, (api, kind)| factory.with_api_strategy(api, kind),
        )
    }
}
