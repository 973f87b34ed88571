//! Outbound request payloads and their local validation
//!
//! Everything here is checked before a request leaves the process, so an
//! invalid action never reaches the network.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entities::{MessageType, RoomType};
use crate::error::DomainError;
use crate::value_objects::{ArtworkId, MessageId, UserId};

/// Longest message body accepted, in characters
pub const MAX_CONTENT_LENGTH: usize = 2000;

/// A message to be sent into the active room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(length(max = 2000, message = "Message must be at most 2000 characters"))]
    pub content: String,

    #[serde(rename = "type")]
    pub message_type: MessageType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<MessageId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_id: Option<ArtworkId>,
}

impl SendMessageRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message_type: MessageType::Text,
            reply_to_id: None,
            artwork_id: None,
        }
    }

    /// Image message; `reference` is the uploaded image location
    pub fn image(reference: impl Into<String>) -> Self {
        Self {
            content: reference.into(),
            message_type: MessageType::Image,
            reply_to_id: None,
            artwork_id: None,
        }
    }

    /// Artwork share with an optional caption
    pub fn artwork(artwork_id: impl Into<ArtworkId>, caption: impl Into<String>) -> Self {
        Self {
            content: caption.into(),
            message_type: MessageType::ArtworkShare,
            reply_to_id: None,
            artwork_id: Some(artwork_id.into()),
        }
    }

    #[must_use]
    pub fn replying_to(mut self, message_id: impl Into<MessageId>) -> Self {
        self.reply_to_id = Some(message_id.into());
        self
    }

    /// Check the per-type content rules, then the field constraints
    pub fn ensure_valid(&self) -> Result<(), DomainError> {
        match self.message_type {
            MessageType::Text | MessageType::Image => {
                if self.content.trim().is_empty() {
                    return Err(DomainError::EmptyContent);
                }
            }
            MessageType::ArtworkShare => {
                if self.artwork_id.as_ref().is_none_or(ArtworkId::is_blank) {
                    return Err(DomainError::MissingArtwork);
                }
            }
        }
        self.validate()?;
        Ok(())
    }
}

/// Room creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub participant_ids: Vec<UserId>,
}

impl CreateRoomRequest {
    pub fn direct(counterpart: impl Into<UserId>) -> Self {
        Self {
            room_type: RoomType::Direct,
            participant_ids: vec![counterpart.into()],
        }
    }

    pub fn group(participant_ids: Vec<UserId>) -> Self {
        Self {
            room_type: RoomType::Group,
            participant_ids,
        }
    }

    /// Validate against the creating user and drop duplicate ids.
    ///
    /// The creator is implicit and must not be listed; a direct room takes
    /// exactly one other participant.
    pub fn normalized(mut self, creator: &UserId) -> Result<Self, DomainError> {
        if self.participant_ids.iter().any(UserId::is_blank) {
            return Err(DomainError::InvalidParticipants(
                "participant id is blank".to_string(),
            ));
        }
        self.participant_ids.retain(|id| id != creator);

        let mut seen = std::collections::HashSet::new();
        self.participant_ids.retain(|id| seen.insert(id.clone()));

        match (self.room_type, self.participant_ids.len()) {
            (_, 0) => Err(DomainError::InvalidParticipants(
                "at least one other participant is required".to_string(),
            )),
            (RoomType::Direct, 1) | (RoomType::Group, _) => Ok(self),
            (RoomType::Direct, n) => Err(DomainError::InvalidParticipants(format!(
                "direct room takes exactly one participant, got {n}"
            ))),
        }
    }
}

/// Trim a user search query, rejecting empty input
pub fn normalize_query(query: &str) -> Result<&str, DomainError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(DomainError::InvalidQuery);
    }
    Ok(query)
}

/// Trim an emoji, rejecting empty input
pub fn normalize_emoji(emoji: &str) -> Result<&str, DomainError> {
    let emoji = emoji.trim();
    if emoji.is_empty() {
        return Err(DomainError::MissingEmoji);
    }
    Ok(emoji)
}
