//! In-memory chat API
//!
//! Rooms, history pages and users live in memory. History fetches can be
//! held back or made to fail per room so tests can order responses.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chat_core::{
    ApiResult, ChatApi, ChatMessage, ChatRoom, ChatUser, CreateRoomRequest, DomainError, RoomId,
    RoomType, UserId,
};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::fixtures::{base_time, user};

/// Releases one held history fetch
#[derive(Debug, Clone)]
pub struct HistoryGate(Arc<Notify>);

impl HistoryGate {
    pub fn release(&self) {
        self.0.notify_one();
    }
}

#[derive(Default)]
struct Inner {
    rooms: Vec<ChatRoom>,
    /// Oldest first
    history: HashMap<RoomId, Vec<ChatMessage>>,
    gates: HashMap<RoomId, Arc<Notify>>,
    failing_history: HashSet<RoomId>,
    fail_rooms: bool,
    users: Vec<ChatUser>,
    marked_read: Vec<RoomId>,
    history_calls: Vec<RoomId>,
    list_calls: usize,
    created: Vec<CreateRoomRequest>,
}

/// Chat API backed by memory
pub struct FakeChatApi {
    current_user: UserId,
    inner: Mutex<Inner>,
}

impl FakeChatApi {
    pub fn new(current_user: impl Into<UserId>) -> Self {
        Self {
            current_user: current_user.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn with_rooms(current_user: impl Into<UserId>, rooms: Vec<ChatRoom>) -> Self {
        let api = Self::new(current_user);
        api.set_rooms(rooms);
        api
    }

    pub fn set_rooms(&self, rooms: Vec<ChatRoom>) {
        self.inner.lock().rooms = rooms;
    }

    /// Set a room's history, oldest first
    pub fn set_history(&self, room_id: impl Into<RoomId>, messages: Vec<ChatMessage>) {
        self.inner.lock().history.insert(room_id.into(), messages);
    }

    /// Hold the next history fetch for `room_id` until the gate is released
    pub fn hold_history(&self, room_id: impl Into<RoomId>) -> HistoryGate {
        let gate = Arc::new(Notify::new());
        self.inner
            .lock()
            .gates
            .insert(room_id.into(), Arc::clone(&gate));
        HistoryGate(gate)
    }

    pub fn fail_history(&self, room_id: impl Into<RoomId>) {
        self.inner.lock().failing_history.insert(room_id.into());
    }

    pub fn fail_rooms(&self, fail: bool) {
        self.inner.lock().fail_rooms = fail;
    }

    pub fn set_users(&self, users: Vec<ChatUser>) {
        self.inner.lock().users = users;
    }

    pub fn marked_read(&self) -> Vec<RoomId> {
        self.inner.lock().marked_read.clone()
    }

    pub fn history_calls(&self) -> Vec<RoomId> {
        self.inner.lock().history_calls.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.inner.lock().list_calls
    }

    pub fn created(&self) -> Vec<CreateRoomRequest> {
        self.inner.lock().created.clone()
    }
}

#[async_trait]
impl ChatApi for FakeChatApi {
    async fn list_rooms(&self) -> ApiResult<Vec<ChatRoom>> {
        let mut inner = self.inner.lock();
        inner.list_calls += 1;
        if inner.fail_rooms {
            return Err(DomainError::Transport("503: rooms unavailable".into()));
        }
        Ok(inner.rooms.clone())
    }

    async fn fetch_history(&self, room_id: &RoomId, limit: u32) -> ApiResult<Vec<ChatMessage>> {
        let gate = {
            let mut inner = self.inner.lock();
            inner.history_calls.push(room_id.clone());
            inner.gates.remove(room_id)
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let inner = self.inner.lock();
        if inner.failing_history.contains(room_id) {
            return Err(DomainError::Transport("500: history unavailable".into()));
        }
        if !inner.rooms.iter().any(|room| &room.id == room_id) {
            return Err(DomainError::RoomNotFound(room_id.clone()));
        }
        Ok(inner
            .history
            .get(room_id)
            .map(|messages| {
                messages
                    .iter()
                    .rev()
                    .take(limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn mark_read(&self, room_id: &RoomId) -> ApiResult<()> {
        self.inner.lock().marked_read.push(room_id.clone());
        Ok(())
    }

    async fn search_users(&self, query: &str) -> ApiResult<Vec<ChatUser>> {
        let query = query.to_lowercase();
        Ok(self
            .inner
            .lock()
            .users
            .iter()
            .filter(|u| u.display_name.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }

    async fn recommended_users(&self) -> ApiResult<Vec<ChatUser>> {
        Ok(self.inner.lock().users.iter().take(3).cloned().collect())
    }

    async fn create_room(&self, request: &CreateRoomRequest) -> ApiResult<ChatRoom> {
        let mut inner = self.inner.lock();
        inner.created.push(request.clone());

        if request.room_type == RoomType::Direct {
            let counterpart = &request.participant_ids[0];
            if let Some(existing) = inner
                .rooms
                .iter()
                .find(|room| room.is_direct() && room.has_participant(counterpart))
            {
                return Ok(existing.clone());
            }
        }

        let mut participants = vec![user(self.current_user.as_str())];
        participants.extend(request.participant_ids.iter().map(|id| user(id.as_str())));
        let id = format!("room-{}", inner.rooms.len() + 1);
        let mut room = match request.room_type {
            RoomType::Direct => ChatRoom::direct(id, participants),
            RoomType::Group => ChatRoom::group(id, "New group", participants),
        };
        room.updated_at = base_time();
        inner.rooms.push(room.clone());
        Ok(room)
    }
}
