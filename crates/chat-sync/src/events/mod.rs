//! Push events and outbound commands
//!
//! Names and payloads of everything exchanged over the push connection after the handshake.

mod event_types;
mod outbound;
mod push;

pub use event_types::{CommandType, PushEventType};
pub use outbound::{AddReactionCommand, OutboundSignal, SendMessageCommand, TypingCommand};
pub use push::{DecodeError, PushEvent, ReadyEvent};
