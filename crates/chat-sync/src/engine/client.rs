//! Cloneable front door to the engine task

use std::sync::Arc;
use std::time::Duration;

use chat_common::{AppError, AppResult};
use chat_core::requests::normalize_query;
use chat_core::{
    ArtworkId, ChatApi, ChatRoom, ChatUser, CreateRoomRequest, MessageId, RoomId,
    SendMessageRequest,
};
use tokio::sync::{mpsc, oneshot, watch};

use super::command::{Command, Reply};
use super::runner::with_timeout;
use super::ChatSnapshot;
use crate::state::ActivationOutcome;

/// Handle used by the UI layer
///
/// Every mutation goes through the engine task; reads come from the latest
/// published [`ChatSnapshot`].
#[derive(Clone)]
pub struct ChatClient {
    commands: mpsc::Sender<Command>,
    api: Arc<dyn ChatApi>,
    snapshot: watch::Receiver<ChatSnapshot>,
    request_timeout: Duration,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

fn engine_stopped() -> AppError {
    AppError::internal(anyhow::anyhow!("sync engine stopped"))
}

impl ChatClient {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        api: Arc<dyn ChatApi>,
        snapshot: watch::Receiver<ChatSnapshot>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            commands,
            api,
            snapshot,
            request_timeout,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> AppResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| engine_stopped())?;
        response.await.map_err(|_| engine_stopped())?
    }

    /// Switch the active room
    ///
    /// Resolves once the room's history is committed, or with
    /// [`ActivationOutcome::Superseded`] if a later activation replaced it.
    ///
    /// # Errors
    /// `Domain(RoomNotFound)` for an unlisted room; the history fetch error
    /// if loading failed, in which case the previous room stays active.
    pub async fn activate_room(&self, room_id: impl Into<RoomId>) -> AppResult<ActivationOutcome> {
        let room_id = room_id.into();
        self.request(|reply| Command::Activate { room_id, reply })
            .await
    }

    /// Send a message to the active room
    ///
    /// The message appears in the store when the server broadcasts it back.
    ///
    /// # Errors
    /// Validation errors, `NoActiveRoom`, or `NotConnected`
    pub async fn send_message(&self, request: SendMessageRequest) -> AppResult<()> {
        self.request(|reply| Command::Send { request, reply }).await
    }

    pub async fn send_text(&self, content: impl Into<String>) -> AppResult<()> {
        self.send_message(SendMessageRequest::text(content)).await
    }

    /// Share an artwork in the active room
    pub async fn share_artwork(
        &self,
        artwork_id: impl Into<ArtworkId>,
        caption: impl Into<String>,
    ) -> AppResult<()> {
        self.send_message(SendMessageRequest::artwork(artwork_id, caption))
            .await
    }

    /// Toggle a reaction; the server decides whether it is added or removed
    pub async fn react(&self, message_id: impl Into<MessageId>, emoji: &str) -> AppResult<()> {
        let message_id = message_id.into();
        let emoji = emoji.to_string();
        self.request(|reply| Command::React {
            message_id,
            emoji,
            reply,
        })
        .await
    }

    pub async fn set_typing(&self, is_typing: bool) -> AppResult<()> {
        self.request(|reply| Command::Typing { is_typing, reply })
            .await
    }

    /// Create a room and make it active
    ///
    /// An existing direct room with the same counterpart is returned instead
    /// of a new one.
    pub async fn create_room(&self, request: CreateRoomRequest) -> AppResult<ChatRoom> {
        self.request(|reply| Command::CreateRoom { request, reply })
            .await
    }

    /// Reload the room list
    pub async fn refresh_rooms(&self) -> AppResult<()> {
        self.request(|reply| Command::RefreshRooms { reply }).await
    }

    /// Search users by name; bypasses the engine
    pub async fn search_users(&self, query: &str) -> AppResult<Vec<ChatUser>> {
        let query = normalize_query(query)?;
        Ok(with_timeout(self.request_timeout, "search", self.api.search_users(query)).await?)
    }

    pub async fn recommended_users(&self) -> AppResult<Vec<ChatUser>> {
        Ok(with_timeout(
            self.request_timeout,
            "recommended users",
            self.api.recommended_users(),
        )
        .await?)
    }

    /// Latest published state
    #[must_use]
    pub fn snapshot(&self) -> ChatSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshot.clone()
    }

    /// Wait until a published snapshot satisfies `predicate`
    ///
    /// # Errors
    /// Fails if the engine stops first
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&ChatSnapshot) -> bool,
    ) -> AppResult<ChatSnapshot> {
        let mut snapshot = self.snapshot.clone();
        let matched = snapshot
            .wait_for(predicate)
            .await
            .map_err(|_| engine_stopped())?;
        Ok(matched.clone())
    }

    pub(crate) async fn shutdown(&self) {
        if self.commands.send(Command::Shutdown).await.is_err() {
            tracing::trace!("Sync engine already stopped");
        }
    }
}
