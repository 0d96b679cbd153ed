//! Topology records advertised by discovery
//!
//! A [`RouteInfo`] is one host's advertised topology entry: its identity,
//! a load-balancing weight, the wire capabilities it supports and the
//! list of APIs it serves. Records are produced wholesale by the
//! discovery collaborator on every topology change and are immutable
//! once constructed: the routing table never edits them, it only
//! replaces the whole map on refresh.

use serde::{Deserialize, Serialize};

use super::host::Host;

/// Default load-balancing weight substituted for zero or negative
/// advertised weights.
pub const DEFAULT_WEIGHT: u32 = 100;

/// Wire-capability flag set advertised by a host.
///
/// Stored as a plain bitmask so it travels unchanged through discovery
/// payloads. Unknown hosts report the empty set.
///
/// # Example
///
/// ```
/// use rpc_router::route::ProtocolFeatures;
///
/// let features = ProtocolFeatures::NONE
///     .with(ProtocolFeatures::GZIP)
///     .with(ProtocolFeatures::JSON);
///
/// assert!(features.contains(ProtocolFeatures::GZIP));
/// assert!(!features.contains(ProtocolFeatures::PROTOBUF));
/// assert_eq!(features.bits(), 0b11);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProtocolFeatures(u32);

impl ProtocolFeatures {
    /// No capabilities (the neutral default for unknown hosts)
    pub const NONE: Self = Self(0);

    /// Payload gzip compression
    pub const GZIP: Self = Self(1);

    /// JSON request/response codec
    pub const JSON: Self = Self(1 << 1);

    /// Protobuf request/response codec
    pub const PROTOBUF: Self = Self(1 << 2);

    /// One-way (fire-and-forget) calls
    pub const ONE_WAY: Self = Self(1 << 3);

    /// Create a feature set from a raw bitmask.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Get the raw bitmask.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check whether all of `other`'s bits are set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Return a copy with `other`'s bits added.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether no capability bits are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// One advertised interface descriptor: the name of an API/method the
/// host serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiInfo {
    /// Fully qualified API/method name
    name: String,
}

impl ApiInfo {
    /// Create a new interface descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Get the API/method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One host's advertised topology entry.
///
/// # Example
///
/// ```
/// use rpc_router::route::{ApiInfo, Host, ProtocolFeatures, RouteInfo};
///
/// let info = RouteInfo::new(
///     Host::new("10.0.0.1", 9527),
///     50,
///     ProtocolFeatures::JSON,
///     vec![ApiInfo::new("order.create"), ApiInfo::new("order.query")],
/// );
///
/// assert_eq!(info.effective_weight(), 50);
/// assert_eq!(info.apis().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    /// Host identity
    host: Host,

    /// Advertised weight; values <= 0 are normalized by
    /// [`RouteInfo::effective_weight`]
    #[serde(default)]
    weight: i32,

    /// Wire-capability flags
    #[serde(default)]
    features: ProtocolFeatures,

    /// APIs this host serves, in advertised order
    #[serde(default)]
    apis: Vec<ApiInfo>,
}

impl RouteInfo {
    /// Create a new topology entry.
    #[must_use]
    pub fn new(
        host: Host,
        weight: i32,
        features: ProtocolFeatures,
        apis: Vec<ApiInfo>,
    ) -> Self {
        Self {
            host,
            weight,
            features,
            apis,
        }
    }

    /// Get the host identity.
    #[must_use]
    pub const fn host(&self) -> &Host {
        &self.host
    }

    /// Get the raw advertised weight, which may be zero or negative.
    #[must_use]
    pub const fn weight(&self) -> i32 {
        self.weight
    }

    /// Get the effective load-balancing weight.
    ///
    /// Zero or negative advertised weights are treated as
    /// [`DEFAULT_WEIGHT`]; malformed entries are never fatal.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn effective_weight(&self) -> u32 {
        if self.weight > 0 {
            self.weight as u32
        } else {
            DEFAULT_WEIGHT
        }
    }

    /// Get the wire-capability flags.
    #[must_use]
    pub const fn features(&self) -> ProtocolFeatures {
        self.features
    }

    /// Get the advertised interface descriptors.
    #[must_use]
    pub fn apis(&self) -> &[ApiInfo] {
        &self.apis
    }
}
