//! Chat room entity - a direct or group conversation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::ChatMessage;
use super::user::{ChatUser, UserStatus};
use crate::value_objects::{MessageId, RoomId, UserId};

/// Room kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoomType {
    /// One-to-one conversation
    #[default]
    Direct,
    /// Conversation between more than two users
    Group,
}

/// Denormalized copy of a room's most recent message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub id: MessageId,
    pub content: String,
    pub sender_id: UserId,
    #[serde(alias = "createdAt")]
    pub timestamp: DateTime<Utc>,
}

impl From<&ChatMessage> for LastMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id.clone(),
            content: message.preview(LAST_MESSAGE_PREVIEW_LEN).to_string(),
            sender_id: message.sender_id.clone(),
            timestamp: message.timestamp,
        }
    }
}

/// Maximum bytes of message text kept in the room summary
pub const LAST_MESSAGE_PREVIEW_LEN: usize = 200;

/// Chat room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub id: RoomId,
    #[serde(rename = "type", default)]
    pub room_type: RoomType,
    #[serde(default)]
    pub participants: Vec<ChatUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<LastMessage>,
    #[serde(default)]
    pub unread_count: u32,
    pub updated_at: DateTime<Utc>,
}

impl ChatRoom {
    /// Create an empty direct room
    pub fn direct(id: impl Into<RoomId>, participants: Vec<ChatUser>) -> Self {
        Self {
            id: id.into(),
            room_type: RoomType::Direct,
            participants,
            name: None,
            last_message: None,
            unread_count: 0,
            updated_at: Utc::now(),
        }
    }

    /// Create an empty named group room
    pub fn group(id: impl Into<RoomId>, name: impl Into<String>, participants: Vec<ChatUser>) -> Self {
        Self {
            id: id.into(),
            room_type: RoomType::Group,
            participants,
            name: Some(name.into()),
            last_message: None,
            unread_count: 0,
            updated_at: Utc::now(),
        }
    }

    #[inline]
    pub fn is_direct(&self) -> bool {
        self.room_type == RoomType::Direct
    }

    pub fn has_participant(&self, user_id: &UserId) -> bool {
        self.participants.iter().any(|user| &user.id == user_id)
    }

    /// The other user in a direct room
    pub fn counterpart(&self, viewer: &UserId) -> Option<&ChatUser> {
        if !self.is_direct() {
            return None;
        }
        self.participants.iter().find(|user| &user.id != viewer)
    }

    /// Name shown in the room list.
    ///
    /// Direct rooms are named after the counterpart; groups use their own name
    /// and fall back to the other participants' names.
    pub fn display_name(&self, viewer: &UserId) -> String {
        if let Some(other) = self.counterpart(viewer) {
            return other.display_name.clone();
        }
        if let Some(name) = self.name.as_deref().filter(|name| !name.trim().is_empty()) {
            return name.to_string();
        }
        let names: Vec<&str> = self
            .participants
            .iter()
            .filter(|user| &user.id != viewer)
            .map(|user| user.display_name.as_str())
            .collect();
        if names.is_empty() {
            self.id.to_string()
        } else {
            names.join(", ")
        }
    }

    /// Fold a newly accepted message into the summary fields.
    ///
    /// Returns false when the message is the summarized one or older than it,
    /// so a redelivered message neither rewinds the summary nor counts twice.
    /// `updated_at` never moves backwards.
    pub fn record_message(&mut self, message: &ChatMessage) -> bool {
        if self
            .last_message
            .as_ref()
            .is_some_and(|last| last.id == message.id || message.timestamp < last.timestamp)
        {
            return false;
        }
        self.last_message = Some(LastMessage::from(message));
        if message.timestamp > self.updated_at {
            self.updated_at = message.timestamp;
        }
        true
    }

    pub fn increment_unread(&mut self) {
        self.unread_count = self.unread_count.saturating_add(1);
    }

    pub fn mark_read(&mut self) {
        self.unread_count = 0;
    }

    /// Update a participant's presence, returning true if anything changed
    pub fn set_participant_status(&mut self, user_id: &UserId, status: UserStatus) -> bool {
        self.participants
            .iter_mut()
            .find(|user| &user.id == user_id)
            .is_some_and(|user| user.set_status(status))
    }
}
