//! Outbound signals - fire-and-forget commands sent over the push connection

use chat_core::{MessageId, RoomId, SendMessageRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::CommandType;
use crate::protocol::GatewayMessage;

/// `SEND_MESSAGE` command body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageCommand {
    pub room_id: RoomId,
    #[serde(flatten)]
    pub message: SendMessageRequest,
}

/// `ADD_REACTION` command body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReactionCommand {
    pub message_id: MessageId,
    pub emoji: String,
}

/// `TYPING` command body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingCommand {
    pub room_id: RoomId,
    pub is_typing: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomCommand {
    room_id: RoomId,
}

/// A command the client sends; none of them are acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundSignal {
    JoinRoom(RoomId),
    LeaveRoom(RoomId),
    SendMessage(SendMessageCommand),
    AddReaction(AddReactionCommand),
    Typing(TypingCommand),
}

impl OutboundSignal {
    pub fn command_type(&self) -> CommandType {
        match self {
            Self::JoinRoom(_) => CommandType::JoinRoom,
            Self::LeaveRoom(_) => CommandType::LeaveRoom,
            Self::SendMessage(_) => CommandType::SendMessage,
            Self::AddReaction(_) => CommandType::AddReaction,
            Self::Typing(_) => CommandType::Typing,
        }
    }

    /// Room this signal targets, if it names one
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::JoinRoom(room_id) | Self::LeaveRoom(room_id) => Some(room_id),
            Self::SendMessage(cmd) => Some(&cmd.room_id),
            Self::Typing(cmd) => Some(&cmd.room_id),
            Self::AddReaction(_) => None,
        }
    }

    pub fn to_gateway_message(&self) -> GatewayMessage {
        let data = match self {
            Self::JoinRoom(room_id) | Self::LeaveRoom(room_id) => json!({ "roomId": room_id }),
            Self::SendMessage(cmd) => serde_json::to_value(cmd).unwrap_or_default(),
            Self::AddReaction(cmd) => serde_json::to_value(cmd).unwrap_or_default(),
            Self::Typing(cmd) => serde_json::to_value(cmd).unwrap_or_default(),
        };
        GatewayMessage::command(self.command_type().as_str(), data)
    }

    /// Parse a command frame, as the gateway sees it
    pub fn from_gateway_message(message: &GatewayMessage) -> Option<Self> {
        let command = CommandType::from_str(message.command_name()?)?;
        let signal = match command {
            CommandType::JoinRoom => Self::JoinRoom(message.payload::<RoomCommand>().ok()?.room_id),
            CommandType::LeaveRoom => {
                Self::LeaveRoom(message.payload::<RoomCommand>().ok()?.room_id)
            }
            CommandType::SendMessage => Self::SendMessage(message.payload().ok()?),
            CommandType::AddReaction => Self::AddReaction(message.payload().ok()?),
            CommandType::Typing => Self::Typing(message.payload().ok()?),
        };
        Some(signal)
    }
}
