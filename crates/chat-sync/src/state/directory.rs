//! Room directory - the room list with live summaries

use chat_core::{ChatMessage, ChatRoom, RoomId, UserId, UserStatus};

/// Rooms the current user belongs to, most recently updated first
#[derive(Debug, Clone, Default)]
pub struct RoomDirectory {
    rooms: Vec<ChatRoom>,
}

impl RoomDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list, dropping duplicate ids
    pub fn replace(&mut self, rooms: Vec<ChatRoom>) {
        let mut unique: Vec<ChatRoom> = Vec::with_capacity(rooms.len());
        for room in rooms {
            if !unique.iter().any(|r| r.id == room.id) {
                unique.push(room);
            }
        }
        unique.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.rooms = unique;
    }

    pub fn rooms(&self) -> &[ChatRoom] {
        &self.rooms
    }

    pub fn get(&self, room_id: &RoomId) -> Option<&ChatRoom> {
        self.rooms.iter().find(|room| &room.id == room_id)
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.position(room_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Sum of unread counters across rooms
    pub fn total_unread(&self) -> u32 {
        self.rooms
            .iter()
            .fold(0u32, |acc, room| acc.saturating_add(room.unread_count))
    }

    fn position(&self, room_id: &RoomId) -> Option<usize> {
        self.rooms.iter().position(|room| &room.id == room_id)
    }

    /// Update a room's summary from a new message.
    ///
    /// Returns `None` if the room is not listed, otherwise whether the
    /// summary changed. A changed room moves up to its `updated_at` slot.
    pub fn record_message(&mut self, message: &ChatMessage, count_unread: bool) -> Option<bool> {
        let index = self.position(&message.room_id)?;
        let mut room = self.rooms.remove(index);

        let changed = room.record_message(message);
        if changed && count_unread {
            room.increment_unread();
        }

        let slot = if changed {
            self.rooms
                .partition_point(|other| other.updated_at > room.updated_at)
        } else {
            index
        };
        self.rooms.insert(slot, room);
        Some(changed)
    }

    /// Insert a room at the front, or move the existing entry with that id there.
    ///
    /// Returns true if the room was already listed.
    pub fn upsert_front(&mut self, room: ChatRoom) -> bool {
        let existed = match self.position(&room.id) {
            Some(index) => {
                self.rooms.remove(index);
                true
            }
            None => false,
        };
        self.rooms.insert(0, room);
        existed
    }

    pub fn mark_read(&mut self, room_id: &RoomId) -> bool {
        match self.position(room_id) {
            Some(index) => {
                self.rooms[index].mark_read();
                true
            }
            None => false,
        }
    }

    /// Patch a user's presence in every room they take part in
    pub fn set_presence(&mut self, user_id: &UserId, status: UserStatus) -> usize {
        self.rooms
            .iter_mut()
            .map(|room| room.set_participant_status(user_id, status))
            .filter(|&changed| changed)
            .count()
    }

    /// Room-list label for `room_id` as seen by `viewer`
    pub fn display_name(&self, room_id: &RoomId, viewer: &UserId) -> Option<String> {
        self.get(room_id).map(|room| room.display_name(viewer))
    }
}
