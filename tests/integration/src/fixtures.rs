//! Test fixtures and data generators
//!
//! Provides reusable rooms, messages, push events and client configuration.

use std::sync::atomic::{AtomicU64, Ordering};

use chat_common::ClientConfig;
use chat_core::{
    ChatEvent, ChatMessage, ChatRoom, ChatUser, MessageId, NewMessageEvent, PresenceEvent,
    ReactionAction, ReactionUpdatedEvent, RoomId, TypingEvent, UserId,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

/// The signed-in user in every test
pub const ME: &str = "me";

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn minutes(offset: i64) -> DateTime<Utc> {
    base_time() + Duration::minutes(offset)
}

pub fn user(id: &str) -> ChatUser {
    ChatUser::new(id, format!("User {id}"))
}

/// Direct room between [`ME`] and `peer`, last updated at `updated` minutes
pub fn direct_room(id: &str, peer: &str, updated: i64) -> ChatRoom {
    let mut room = ChatRoom::direct(id, vec![user(ME), user(peer)]);
    room.updated_at = minutes(updated);
    room
}

pub fn group_room(id: &str, name: &str, members: &[&str], updated: i64) -> ChatRoom {
    let mut participants = vec![user(ME)];
    participants.extend(members.iter().map(|m| user(m)));
    let mut room = ChatRoom::group(id, name, participants);
    room.updated_at = minutes(updated);
    room
}

/// Three direct rooms: `A` (newest), `B`, `C`
pub fn three_rooms() -> Vec<ChatRoom> {
    vec![
        direct_room("A", "alice", 3),
        direct_room("B", "bob", 2),
        direct_room("C", "carol", 1),
    ]
}

pub fn text_message(id: &str, room_id: &str, sender: &str, at: i64) -> ChatMessage {
    ChatMessage::text(id, room_id, sender, format!("message {id}")).at(minutes(at))
}

/// `count` messages `{room}-1..={count}`, oldest first
pub fn history(room_id: &str, sender: &str, count: usize) -> Vec<ChatMessage> {
    (1..=count)
        .map(|i| text_message(&format!("{room_id}-{i}"), room_id, sender, i as i64))
        .collect()
}

pub fn new_message(message: ChatMessage) -> ChatEvent {
    ChatEvent::NewMessage(NewMessageEvent {
        room_id: message.room_id.clone(),
        message,
    })
}

pub fn reaction(
    message_id: &str,
    user_id: &str,
    emoji: &str,
    action: ReactionAction,
) -> ChatEvent {
    ChatEvent::ReactionUpdated(ReactionUpdatedEvent {
        message_id: MessageId::new(message_id),
        user_id: UserId::new(user_id),
        emoji: emoji.to_string(),
        action,
        room_id: None,
    })
}

pub fn online(user_id: &str) -> ChatEvent {
    ChatEvent::UserOnline(PresenceEvent {
        user_id: UserId::new(user_id),
    })
}

pub fn typing(room_id: &str, user_id: &str, is_typing: bool) -> ChatEvent {
    ChatEvent::Typing(TypingEvent {
        room_id: RoomId::new(room_id),
        user_id: UserId::new(user_id),
        is_typing,
    })
}

/// Client configuration pointing at a test gateway
///
/// Reconnects are fast; `rehydrate_after_secs` of 0 re-hydrates on every
/// reconnect.
pub fn test_config(gateway_url: &str, rehydrate_after_secs: u64) -> ClientConfig {
    let rehydrate = rehydrate_after_secs.to_string();
    let vars = [
        ("APP_ENV", "development"),
        ("CHAT_API_URL", "http://127.0.0.1:9"),
        ("CHAT_GATEWAY_URL", gateway_url),
        ("CHAT_NAMESPACE", "chat"),
        ("CHAT_REQUEST_TIMEOUT_SECS", "2"),
        ("CHAT_CONNECT_TIMEOUT_SECS", "2"),
        ("CHAT_HISTORY_LIMIT", "50"),
        ("CHAT_REHYDRATE_AFTER_SECS", rehydrate.as_str()),
        ("CHAT_RECONNECT_DELAY_MS", "20"),
        ("CHAT_RECONNECT_MAX_DELAY_MS", "100"),
    ];
    ClientConfig::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
    })
    .unwrap_or_else(|e| panic!("invalid test config: {e}"))
}
