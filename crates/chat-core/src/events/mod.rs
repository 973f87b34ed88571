//! Chat events - server-originated changes the client must fold into its state

mod chat_event;

pub use chat_event::{ChatEvent, NewMessageEvent, PresenceEvent, ReactionUpdatedEvent, TypingEvent};
