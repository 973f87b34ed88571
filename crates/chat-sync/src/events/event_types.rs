//! Push event and command names
//!
//! Dispatch messages carry a `PushEventType` in `t`; command messages carry a `CommandType`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispatch event names sent by the chat gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PushEventType {
    /// Sent after successful Identify
    Ready,
    /// Message accepted into a room
    NewMessage,
    /// A reaction was added or removed
    ReactionUpdated,
    UserOnline,
    UserOffline,
    /// Typing started or stopped
    Typing,
}

impl PushEventType {
    /// Get the string representation of the event type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::NewMessage => "NEW_MESSAGE",
            Self::ReactionUpdated => "REACTION_UPDATED",
            Self::UserOnline => "USER_ONLINE",
            Self::UserOffline => "USER_OFFLINE",
            Self::Typing => "TYPING",
        }
    }

    /// Parse an event type from a string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "READY" => Some(Self::Ready),
            "NEW_MESSAGE" => Some(Self::NewMessage),
            "REACTION_UPDATED" => Some(Self::ReactionUpdated),
            "USER_ONLINE" => Some(Self::UserOnline),
            "USER_OFFLINE" => Some(Self::UserOffline),
            "TYPING" => Some(Self::Typing),
            _ => None,
        }
    }
}

impl fmt::Display for PushEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command names the client sends with op 6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    /// Subscribe to a room's push events
    JoinRoom,
    /// Unsubscribe from a room
    LeaveRoom,
    SendMessage,
    /// Toggle the sender's reaction; the server answers with REACTION_UPDATED
    AddReaction,
    Typing,
}

impl CommandType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JoinRoom => "JOIN_ROOM",
            Self::LeaveRoom => "LEAVE_ROOM",
            Self::SendMessage => "SEND_MESSAGE",
            Self::AddReaction => "ADD_REACTION",
            Self::Typing => "TYPING",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "JOIN_ROOM" => Some(Self::JoinRoom),
            "LEAVE_ROOM" => Some(Self::LeaveRoom),
            "SEND_MESSAGE" => Some(Self::SendMessage),
            "ADD_REACTION" => Some(Self::AddReaction),
            "TYPING" => Some(Self::Typing),
            _ => None,
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
