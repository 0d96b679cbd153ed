//! Error types for rpc-router
//!
//! This module defines the error hierarchy for the routing table and its
//! collaborators. Errors are categorized by subsystem and include recovery
//! hints.
//!
//! Note that the two ordinary query outcomes, "no route for this API" and
//! "unknown host", are *not* errors at the routing-table surface:
//! `RouteTable::router_for` returns `None` and
//! `RouteTable::protocol_features_of` returns the empty feature set. The
//! [`RouteError::NoRoute`] variant exists for call-path code that needs to
//! turn the absent router into a failed RPC outcome.

use std::io;

use thiserror::Error;

/// Top-level error type for rpc-router
#[derive(Debug, Error)]
pub enum RpcRouterError {
    /// Configuration errors (file parsing, validation)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Routing errors
    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl RpcRouterError {
    /// Check if this error is recoverable (can retry the operation)
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(e) => e.is_recoverable(),
            Self::Route(e) => e.is_recoverable(),
            Self::Session(e) => e.is_recoverable(),
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found or inaccessible
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Validation error (invalid values, missing required fields)
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Environment variable error
    #[error("Environment variable error: {name}: {reason}")]
    EnvError { name: String, reason: String },

    /// I/O error while reading config
    #[error("I/O error reading configuration: {0}")]
    IoError(#[from] io::Error),
}

impl ConfigError {
    /// Config errors are generally not recoverable without user intervention
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        false
    }
}

/// Routing errors
#[derive(Debug, Error)]
pub enum RouteError {
    /// No reachable server for the API
    ///
    /// Raised by call-path code when `router_for` returns `None`. A later
    /// topology refresh may make the API routable again.
    #[error("No route available for API: {api}")]
    NoRoute { api: String },

    /// A host string could not be parsed as `address:port`
    #[error("Invalid host: {input}")]
    InvalidHost { input: String },
}

impl RouteError {
    /// Check if this error is recoverable
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            // A refresh may bring the API back
            Self::NoRoute { .. } => true,
            Self::InvalidHost { .. } => false,
        }
    }

    /// Create a no-route error
    pub fn no_route(api: impl Into<String>) -> Self {
        Self::NoRoute { api: api.into() }
    }

    /// Create an invalid-host error
    pub fn invalid_host(input: impl Into<String>) -> Self {
        Self::InvalidHost {
            input: input.into(),
        }
    }
}

/// Session lifecycle errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session is draining and no longer accepts new work
    #[error("Session for {host} is draining")]
    Draining { host: String },

    /// The session has been closed
    #[error("Session for {host} is closed")]
    Closed { host: String },
}

impl SessionError {
    /// Check if this error is recoverable
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        // The caller can open a fresh session to a live host
        true
    }

    /// Create a draining error
    pub fn draining(host: impl ToString) -> Self {
        Self::Draining {
            host: host.to_string(),
        }
    }

    /// Create a closed error
    pub fn closed(host: impl ToString) -> Self {
        Self::Closed {
            host: host.to_string(),
        }
    }
}

/// Type alias for Result with `RpcRouterError`
pub type Result<T> = std::result::Result<T, RpcRouterError>;
