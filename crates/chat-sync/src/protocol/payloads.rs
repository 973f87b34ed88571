//! Handshake payload definitions

use serde::{Deserialize, Serialize};

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    /// Default heartbeat interval (45 seconds)
    pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 45_000;

    /// Lowest interval the client honors; anything below is clamped
    pub const MIN_HEARTBEAT_INTERVAL: u64 = 100;

    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }

    /// Heartbeat interval as a duration, clamped to the minimum
    #[must_use]
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.heartbeat_interval.max(Self::MIN_HEARTBEAT_INTERVAL))
    }
}

impl Default for HelloPayload {
    fn default() -> Self {
        Self::with_interval(Self::DEFAULT_HEARTBEAT_INTERVAL)
    }
}

/// Payload for op 2 (Identify)
///
/// Sent by the client to authenticate the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Bearer token of the current user
    pub token: String,

    /// Push namespace the client subscribes to
    pub namespace: String,

    /// Optional client properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IdentifyProperties>,
}

impl IdentifyPayload {
    #[must_use]
    pub fn new(token: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            namespace: namespace.into(),
            properties: Some(IdentifyProperties::current()),
        }
    }
}

/// Client connection properties
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifyProperties {
    /// Operating system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// Client name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,

    /// Client version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl IdentifyProperties {
    /// Properties describing this build
    #[must_use]
    pub fn current() -> Self {
        Self::default()
            .with_os(std::env::consts::OS)
            .with_client(env!("CARGO_PKG_NAME"))
            .with_version(env!("CARGO_PKG_VERSION"))
    }

    #[must_use]
    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}
