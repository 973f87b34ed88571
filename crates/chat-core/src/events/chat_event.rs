//! Push event payloads
//!
//! Each variant corresponds to one dispatch the gateway can deliver on the
//! chat namespace.

use serde::{Deserialize, Serialize};

use crate::entities::{ChatMessage, ReactionAction};
use crate::value_objects::{MessageId, RoomId, UserId};

/// All chat push events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatEvent {
    NewMessage(NewMessageEvent),
    ReactionUpdated(ReactionUpdatedEvent),
    UserOnline(PresenceEvent),
    UserOffline(PresenceEvent),
    Typing(TypingEvent),
}

impl ChatEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::NewMessage(_) => "NEW_MESSAGE",
            Self::ReactionUpdated(_) => "REACTION_UPDATED",
            Self::UserOnline(_) => "USER_ONLINE",
            Self::UserOffline(_) => "USER_OFFLINE",
            Self::Typing(_) => "TYPING",
        }
    }

    /// Room the event is scoped to, if any
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::NewMessage(e) => Some(&e.room_id),
            Self::ReactionUpdated(e) => e.room_id.as_ref(),
            Self::Typing(e) => Some(&e.room_id),
            Self::UserOnline(_) | Self::UserOffline(_) => None,
        }
    }
}

// ============================================================================
// Event Payloads
// ============================================================================

/// A message was accepted into a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessageEvent {
    pub room_id: RoomId,
    pub message: ChatMessage,
}

/// A user's reaction on a message changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionUpdatedEvent {
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: String,
    pub action: ReactionAction,
    /// Not every server build includes the room
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
}

/// A user came online or went offline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    pub user_id: UserId,
}

/// A user started or stopped typing in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub room_id: RoomId,
    pub user_id: UserId,
    #[serde(default = "default_is_typing")]
    pub is_typing: bool,
}

fn default_is_typing() -> bool {
    true
}
