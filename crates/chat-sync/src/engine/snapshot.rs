//! Read-only view of the chat state for observers

use chat_core::{ChatRoom, MessageId, RoomId, UserId};
use serde::Serialize;

use crate::connection::ConnectionState;
use crate::state::{StoredMessage, SyncState};

/// Copy of the state published after every transition
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSnapshot {
    pub connection: ConnectionState,
    pub rooms: Vec<ChatRoom>,
    pub active_room: Option<RoomId>,
    /// Room whose history is being loaded
    pub activating: Option<RoomId>,
    #[serde(skip)]
    pub messages: Vec<StoredMessage>,
    pub typing: Vec<UserId>,
    pub total_unread: u32,
    pub auth_error: Option<String>,
}

impl ChatSnapshot {
    pub(crate) fn capture(state: &SyncState) -> Self {
        Self {
            connection: state.connection(),
            rooms: state.directory().rooms().to_vec(),
            active_room: state.active_room().cloned(),
            activating: state.activating().cloned(),
            messages: state.store().messages().to_vec(),
            typing: state.store().typing().cloned().collect(),
            total_unread: state.directory().total_unread(),
            auth_error: state.auth_error().map(str::to_string),
        }
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&ChatRoom> {
        self.rooms.iter().find(|room| &room.id == room_id)
    }

    pub fn message(&self, message_id: &MessageId) -> Option<&StoredMessage> {
        self.messages.iter().find(|m| &m.message.id == message_id)
    }

    pub fn message_ids(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.message.id.as_str()).collect()
    }
}
