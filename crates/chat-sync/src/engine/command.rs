//! Messages into the engine task

use chat_common::AppResult;
use chat_core::{
    ApiResult, ChatMessage, ChatRoom, CreateRoomRequest, MessageId, RoomId, SendMessageRequest,
};
use tokio::sync::oneshot;

use crate::state::{ActivationOutcome, Ticket};

pub(crate) type Reply<T> = oneshot::Sender<AppResult<T>>;

/// Requests from [`super::ChatClient`]
#[derive(Debug)]
pub(crate) enum Command {
    Activate {
        room_id: RoomId,
        reply: Reply<ActivationOutcome>,
    },
    Send {
        request: SendMessageRequest,
        reply: Reply<()>,
    },
    React {
        message_id: MessageId,
        emoji: String,
        reply: Reply<()>,
    },
    Typing {
        is_typing: bool,
        reply: Reply<()>,
    },
    CreateRoom {
        request: CreateRoomRequest,
        reply: Reply<ChatRoom>,
    },
    RefreshRooms {
        reply: Reply<()>,
    },
    Shutdown,
}

/// Results of requests the engine spawned
#[derive(Debug)]
pub(crate) enum Completion {
    History {
        ticket: Ticket,
        room_id: RoomId,
        result: ApiResult<Vec<ChatMessage>>,
    },
    Rooms(ApiResult<Vec<ChatRoom>>),
    Created {
        result: ApiResult<ChatRoom>,
        reply: Reply<ChatRoom>,
    },
}
