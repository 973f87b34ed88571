//! # chat-sync
//!
//! Client-side synchronization engine for real-time chat: the push
//! connection, the room directory, the active room's message store and the
//! reducer that keeps them consistent.

pub mod api;
pub mod connection;
pub mod engine;
pub mod events;
pub mod protocol;
pub mod session;
pub mod state;

pub use api::RestChatApi;
pub use engine::{ChatClient, ChatSnapshot, EngineSettings, SyncEngine};
pub use session::{ChatSession, Identity};
