//! Inbound dispatch decoding

use chat_core::{
    ChatEvent, NewMessageEvent, PresenceEvent, ReactionUpdatedEvent, TypingEvent, UserId,
};
use serde::{Deserialize, Serialize};

use super::PushEventType;
use crate::protocol::{GatewayMessage, OpCode};

/// READY event payload
///
/// Sent after a successful Identify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyEvent {
    pub user_id: UserId,
    pub session_id: String,
}

/// A decoded dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Ready(ReadyEvent),
    Chat(ChatEvent),
}

/// Why a dispatch could not be decoded
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("not a dispatch: {0}")]
    NotDispatch(OpCode),

    #[error("dispatch without event name")]
    MissingEventName,

    #[error("malformed {event} payload: {source}")]
    Payload {
        event: PushEventType,
        #[source]
        source: serde_json::Error,
    },
}

impl PushEvent {
    /// Decode a dispatch message.
    ///
    /// Returns `Ok(None)` for event names this client does not know, so newer
    /// servers can add events without breaking older clients.
    pub fn decode(message: &GatewayMessage) -> Result<Option<Self>, DecodeError> {
        if message.op != OpCode::Dispatch {
            return Err(DecodeError::NotDispatch(message.op));
        }
        let name = message.t.as_deref().ok_or(DecodeError::MissingEventName)?;
        let Some(event) = PushEventType::from_str(name) else {
            return Ok(None);
        };

        let wrap = |source| DecodeError::Payload { event, source };
        let decoded = match event {
            PushEventType::Ready => Self::Ready(message.payload::<ReadyEvent>().map_err(wrap)?),
            PushEventType::NewMessage => Self::Chat(ChatEvent::NewMessage(
                message.payload::<NewMessageEvent>().map_err(wrap)?,
            )),
            PushEventType::ReactionUpdated => Self::Chat(ChatEvent::ReactionUpdated(
                message.payload::<ReactionUpdatedEvent>().map_err(wrap)?,
            )),
            PushEventType::UserOnline => Self::Chat(ChatEvent::UserOnline(
                message.payload::<PresenceEvent>().map_err(wrap)?,
            )),
            PushEventType::UserOffline => Self::Chat(ChatEvent::UserOffline(
                message.payload::<PresenceEvent>().map_err(wrap)?,
            )),
            PushEventType::Typing => Self::Chat(ChatEvent::Typing(
                message.payload::<TypingEvent>().map_err(wrap)?,
            )),
        };
        Ok(Some(decoded))
    }

    /// Encode as a dispatch, the inverse of [`PushEvent::decode`]
    pub fn to_gateway_message(&self, sequence: u64) -> GatewayMessage {
        let (name, data) = match self {
            Self::Ready(ready) => (PushEventType::Ready, serde_json::to_value(ready)),
            Self::Chat(ChatEvent::NewMessage(e)) => {
                (PushEventType::NewMessage, serde_json::to_value(e))
            }
            Self::Chat(ChatEvent::ReactionUpdated(e)) => {
                (PushEventType::ReactionUpdated, serde_json::to_value(e))
            }
            Self::Chat(ChatEvent::UserOnline(e)) => {
                (PushEventType::UserOnline, serde_json::to_value(e))
            }
            Self::Chat(ChatEvent::UserOffline(e)) => {
                (PushEventType::UserOffline, serde_json::to_value(e))
            }
            Self::Chat(ChatEvent::Typing(e)) => (PushEventType::Typing, serde_json::to_value(e)),
        };
        GatewayMessage::dispatch(name.as_str(), sequence, data.unwrap_or_default())
    }
}
