//! Chat API port - the request/response side of the chat backend
//!
//! The engine depends only on this trait; the HTTP adapter and the test fakes
//! provide the implementations.

use async_trait::async_trait;

use crate::entities::{ChatMessage, ChatRoom, ChatUser};
use crate::error::DomainError;
use crate::requests::CreateRoomRequest;
use crate::value_objects::RoomId;

/// Result type for chat API calls
pub type ApiResult<T> = Result<T, DomainError>;

#[async_trait]
pub trait ChatApi: Send + Sync {
    /// List every room the current user belongs to
    async fn list_rooms(&self) -> ApiResult<Vec<ChatRoom>>;

    /// Fetch the most recent page of a room's history, newest first
    async fn fetch_history(&self, room_id: &RoomId, limit: u32) -> ApiResult<Vec<ChatMessage>>;

    /// Mark a room as read for the current user
    async fn mark_read(&self, room_id: &RoomId) -> ApiResult<()>;

    /// Search users by name
    async fn search_users(&self, query: &str) -> ApiResult<Vec<ChatUser>>;

    /// Users suggested as new conversation partners
    async fn recommended_users(&self) -> ApiResult<Vec<ChatUser>>;

    /// Create a room, or return the existing direct room with the same counterpart
    async fn create_room(&self, request: &CreateRoomRequest) -> ApiResult<ChatRoom>;
}
