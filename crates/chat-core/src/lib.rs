//! # chat-core
//!
//! Domain layer containing chat entities, value objects, reaction aggregation,
//! push event payloads, and the chat API port.
//! This crate has zero dependencies on infrastructure (network, runtime, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod requests;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    ArtworkShare, ChatMessage, ChatRoom, ChatUser, LastMessage, MessageType, ReactionAction,
    ReactionEntry, ReactionSet, ReactionSummary, RoomType, SenderSummary, UserRole, UserStatus,
};
pub use error::DomainError;
pub use events::{ChatEvent, NewMessageEvent, PresenceEvent, ReactionUpdatedEvent, TypingEvent};
pub use requests::{CreateRoomRequest, SendMessageRequest, MAX_CONTENT_LENGTH};
pub use traits::{ApiResult, ChatApi};
pub use value_objects::{ArtworkId, MessageId, RoomId, UserId};
