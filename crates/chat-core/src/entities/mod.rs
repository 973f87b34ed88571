//! Domain entities - core chat objects

mod message;
mod reaction;
mod room;
mod user;

pub use message::{ArtworkShare, ChatMessage, MessageType, SenderSummary};
pub use reaction::{ReactionAction, ReactionEntry, ReactionSet, ReactionSummary};
pub use room::{ChatRoom, LastMessage, RoomType, LAST_MESSAGE_PREVIEW_LEN};
pub use user::{ChatUser, UserRole, UserStatus};
