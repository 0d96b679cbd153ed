//! Configuration loading
//!
//! Loads routing configuration from JSON files with optional
//! environment overrides.

use std::path::Path;

use tracing::{debug, info};

use super::types::RoutingConfig;
use crate::error::ConfigError;
use crate::route::StrategyKind;

/// Load routing configuration from a JSON file.
///
/// # Arguments
///
/// * `path` - Path to the configuration file
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed.
pub fn load_config(path: impl AsRef<Path>) -> Result<RoutingConfig, ConfigError> {
    let path = path.as_ref();

    debug!("Loading routing configuration from {:?}", path);

    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(path)?;

    let config: RoutingConfig = serde_json::from_str(&contents)
        .map_err(|e| ConfigError::ParseError(format!("Failed to parse JSON: {e} at {path:?}")))?;

    config.validate()?;

    info!(
        "Routing configuration loaded: default={}, {} API overrides",
        config.default_strategy,
        config.api_strategies.len()
    );

    Ok(config)
}

/// Load routing configuration from a JSON string.
///
/// # Errors
///
/// Returns `ConfigError` if parsing or validation fails.
pub fn load_config_str(json: &str) -> Result<RoutingConfig, ConfigError> {
    let config: RoutingConfig =
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.validate()?;

    Ok(config)
}

/// Load routing configuration with environment variable overrides.
///
/// Environment variables:
/// - `RPC_ROUTER_DEFAULT_STRATEGY`: Override the default strategy
///   (`weighted_random` or `round_robin`)
///
/// # Errors
///
/// Returns `ConfigError` if loading or parsing fails, or if an override
/// value is not a known strategy name.
pub fn load_config_with_env(path: impl AsRef<Path>) -> Result<RoutingConfig, ConfigError> {
    let mut config = load_config(path)?;

    if let Ok(name) = std::env::var("RPC_ROUTER_DEFAULT_STRATEGY") {
        let kind: StrategyKind =
            serde_json::from_value(serde_json::Value::String(name.clone())).map_err(|_| {
                ConfigError::EnvError {
                    name: "RPC_ROUTER_DEFAULT_STRATEGY".into(),
                    reason: format!("Unknown strategy: {name}"),
                }
            })?;
        config.default_strategy = kind;
        debug!("Default strategy overridden to {}", config.default_strategy);
    }

    Ok(config)
}
