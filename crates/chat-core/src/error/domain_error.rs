//! Domain errors - error types for the chat domain layer

use thiserror::Error;
use validator::ValidationErrors;

use crate::requests::MAX_CONTENT_LENGTH;
use crate::value_objects::{MessageId, RoomId};

/// Domain layer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Message content is empty")]
    EmptyContent,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Artwork share requires an artwork id")]
    MissingArtwork,

    #[error("Reaction requires an emoji")]
    MissingEmoji,

    #[error("Invalid participants: {0}")]
    InvalidParticipants(String),

    #[error("Search query is empty")]
    InvalidQuery,

    #[error("Validation error: {0}")]
    Validation(String),

    // =========================================================================
    // State Errors
    // =========================================================================
    #[error("No room is active")]
    NoActiveRoom,

    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    // =========================================================================
    // Infrastructure Errors (reported by the chat API port)
    // =========================================================================
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Timed out: {0}")]
    TimedOut(&'static str),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl DomainError {
    /// Get a stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            // Validation
            Self::EmptyContent => "EMPTY_CONTENT",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::MissingArtwork => "MISSING_ARTWORK",
            Self::MissingEmoji => "MISSING_EMOJI",
            Self::InvalidParticipants(_) => "INVALID_PARTICIPANTS",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::Validation(_) => "VALIDATION_ERROR",

            // State
            Self::NoActiveRoom => "NO_ACTIVE_ROOM",
            Self::RoomNotFound(_) => "UNKNOWN_ROOM",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",

            // Infrastructure
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::TimedOut(_) => "TIMED_OUT",
            Self::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Check if this error was raised before any network call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyContent
                | Self::ContentTooLong { .. }
                | Self::MissingArtwork
                | Self::MissingEmoji
                | Self::InvalidParticipants(_)
                | Self::InvalidQuery
                | Self::Validation(_)
        )
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RoomNotFound(_) | Self::MessageNotFound(_))
    }

    /// Check if this error came from the remote side
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Unauthorized(_) | Self::TimedOut(_) | Self::Decode(_)
        )
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let content_too_long = errors
            .field_errors()
            .get("content")
            .is_some_and(|errs| errs.iter().any(|e| e.code == "length"));
        if content_too_long {
            return Self::ContentTooLong {
                max: MAX_CONTENT_LENGTH,
            };
        }
        Self::Validation(errors.to_string())
    }
}
