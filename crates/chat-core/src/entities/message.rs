//! Chat message entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reaction::ReactionSet;
use crate::value_objects::{ArtworkId, MessageId, RoomId, UserId};

/// Kind of message content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    #[default]
    Text,
    /// `content` holds the image reference
    Image,
    /// `artwork` holds the shared listing
    ArtworkShare,
}

impl MessageType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::ArtworkShare => "ARTWORK_SHARE",
        }
    }
}

/// Artwork listing embedded in a share message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkShare {
    pub id: ArtworkId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "imageUrl")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
}

/// Denormalized sender fields carried on each message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderSummary {
    pub id: UserId,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "profileImage")]
    pub avatar: Option<String>,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<SenderSummary>,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<ArtworkShare>,
    #[serde(default)]
    pub reactions: ReactionSet,
    #[serde(alias = "createdAt")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a plain text message stamped now
    pub fn text(
        id: impl Into<MessageId>,
        room_id: impl Into<RoomId>,
        sender_id: impl Into<UserId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            room_id: room_id.into(),
            sender_id: sender_id.into(),
            sender: None,
            content: content.into(),
            message_type: MessageType::Text,
            reply_to_id: None,
            artwork: None,
            reactions: ReactionSet::new(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn replying_to(mut self, message_id: impl Into<MessageId>) -> Self {
        self.reply_to_id = Some(message_id.into());
        self
    }

    #[must_use]
    pub fn with_sender(mut self, sender: SenderSummary) -> Self {
        self.sender = Some(sender);
        self
    }

    #[inline]
    pub fn is_reply(&self) -> bool {
        self.reply_to_id.is_some()
    }

    /// Short text for room-list previews (never splits a character)
    pub fn preview(&self, max_len: usize) -> &str {
        let source = match self.message_type {
            MessageType::Text => self.content.as_str(),
            MessageType::Image => "[image]",
            MessageType::ArtworkShare => self
                .artwork
                .as_ref()
                .map_or("[artwork]", |artwork| artwork.title.as_str()),
        };

        if source.len() <= max_len {
            source
        } else {
            let mut end = max_len;
            while !source.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &source[..end]
        }
    }
}
