//! Connection lifecycle types

use chat_core::{ChatEvent, UserId};
use serde::Serialize;
use std::fmt;

/// Connection state
///
/// One value per session, published through a `watch` channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    /// No socket; outbound signals are rejected
    #[default]
    Disconnected,
    /// Handshake or reconnect in progress
    Connecting,
    /// Identified and receiving dispatches
    Connected,
    /// Gave up: authentication rejected, connect timed out or retries exhausted
    Error,
}

impl ConnectionState {
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an established connection went away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The server closed the socket
    Closed { code: Option<u16>, reason: String },
    /// A heartbeat went unacknowledged
    HeartbeatTimeout,
    /// Read or write failed
    Transport(String),
    /// The server asked the client to reconnect (op 5)
    ServerRequested,
    /// `disconnect()` was called
    ClientClosed,
}

impl DisconnectReason {
    /// Another connect attempt may succeed
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        !matches!(self, Self::ClientClosed)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed { code: Some(code), reason } => write!(f, "closed ({code}): {reason}"),
            Self::Closed { code: None, reason } => write!(f, "closed: {reason}"),
            Self::HeartbeatTimeout => f.write_str("heartbeat not acknowledged"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::ServerRequested => f.write_str("server requested reconnect"),
            Self::ClientClosed => f.write_str("closed by client"),
        }
    }
}

/// Typed event stream emitted by the connection
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// READY received, after the first connect and after every reconnect
    Connected { session_id: String, user_id: UserId },
    Disconnected(DisconnectReason),
    /// The token was rejected; no further attempts are made
    AuthError { reason: String },
    /// A chat dispatch
    Push(ChatEvent),
}
