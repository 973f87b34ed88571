//! Synchronization reducer
//!
//! Every change to the room directory, the active message store and the
//! reactions on its messages goes through [`SyncState::reduce`]. The reducer
//! never performs I/O; anything that needs the network is returned as an
//! [`Effect`] for the engine to carry out, and the engine feeds the result
//! back in as another [`SyncEvent`].

use std::time::Duration;

use chat_core::requests::normalize_emoji;
use chat_core::{
    ChatEvent, ChatMessage, ChatRoom, DomainError, MessageId, NewMessageEvent,
    ReactionUpdatedEvent, RoomId, SendMessageRequest, TypingEvent, UserId, UserStatus,
};
use chrono::{DateTime, Utc};

use super::activation::{
    ActivationOutcome, ActivationPhase, ActivationTracker, PendingActivation, Ticket,
};
use super::directory::RoomDirectory;
use super::store::MessageStore;
use crate::connection::{ConnectionState, DisconnectReason};
use crate::events::{AddReactionCommand, OutboundSignal, SendMessageCommand, TypingCommand};

/// Input to the reducer
#[derive(Debug, Clone)]
pub enum SyncEvent {
    // === Request/response results ===
    RoomsLoaded(Vec<ChatRoom>),
    RoomsFailed(DomainError),
    HistoryLoaded {
        ticket: Ticket,
        room_id: RoomId,
        /// Newest first, as the history endpoint returns it
        messages: Vec<ChatMessage>,
    },
    HistoryFailed {
        ticket: Ticket,
        room_id: RoomId,
        error: DomainError,
    },
    RoomCreated {
        room: ChatRoom,
        ticket: Ticket,
    },

    // === Connection ===
    Connected {
        at: DateTime<Utc>,
    },
    Disconnected {
        reason: DisconnectReason,
        at: DateTime<Utc>,
    },
    AuthError {
        reason: String,
    },

    // === Push ===
    NewMessage(NewMessageEvent),
    ReactionUpdated(ReactionUpdatedEvent),
    UserOnline(UserId),
    UserOffline(UserId),
    Typing(TypingEvent),

    // === Local actions ===
    ActivateRequested {
        room_id: RoomId,
        ticket: Ticket,
    },
    SendRequested(SendMessageRequest),
    ReactRequested {
        message_id: MessageId,
        emoji: String,
    },
    TypingRequested {
        is_typing: bool,
    },
    IdentityCleared,
}

impl From<ChatEvent> for SyncEvent {
    fn from(event: ChatEvent) -> Self {
        match event {
            ChatEvent::NewMessage(e) => Self::NewMessage(e),
            ChatEvent::ReactionUpdated(e) => Self::ReactionUpdated(e),
            ChatEvent::UserOnline(e) => Self::UserOnline(e.user_id),
            ChatEvent::UserOffline(e) => Self::UserOffline(e.user_id),
            ChatEvent::Typing(e) => Self::Typing(e),
        }
    }
}

/// Work the reducer asks the engine to do
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fire-and-forget signal over the push connection
    Signal(OutboundSignal),
    FetchHistory { room_id: RoomId, ticket: Ticket },
    /// Best-effort; the outcome is only logged
    MarkRead { room_id: RoomId },
    RefreshRooms,
    /// Report an activation result to whoever requested `ticket`
    ActivationSettled {
        ticket: Ticket,
        result: Result<ActivationOutcome, DomainError>,
    },
}

/// Reducer tuning
#[derive(Debug, Clone, Copy)]
pub struct SyncPolicy {
    /// A reconnect after a longer gap re-hydrates the active room and the room list
    pub rehydrate_after: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            rehydrate_after: Duration::from_secs(5),
        }
    }
}

/// Client-side chat state
#[derive(Debug, Clone)]
pub struct SyncState {
    current_user: UserId,
    policy: SyncPolicy,
    directory: RoomDirectory,
    store: MessageStore,
    active: Option<RoomId>,
    /// Room the server currently has us subscribed to
    joined: Option<RoomId>,
    activation: ActivationTracker,
    connection: ConnectionState,
    disconnected_at: Option<DateTime<Utc>>,
    auth_error: Option<String>,
    rooms_refresh_pending: bool,
}

impl SyncState {
    #[must_use]
    pub fn new(current_user: UserId, policy: SyncPolicy) -> Self {
        Self {
            current_user,
            policy,
            directory: RoomDirectory::new(),
            store: MessageStore::new(),
            active: None,
            joined: None,
            activation: ActivationTracker::new(),
            connection: ConnectionState::Disconnected,
            disconnected_at: None,
            auth_error: None,
            rooms_refresh_pending: false,
        }
    }

    pub fn current_user(&self) -> &UserId {
        &self.current_user
    }

    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    /// Message store of the active room
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn active_room(&self) -> Option<&RoomId> {
        self.active.as_ref()
    }

    /// Target of the in-flight activation
    pub fn activating(&self) -> Option<&RoomId> {
        self.activation.pending().map(|p| &p.target)
    }

    pub fn activation_phase(&self) -> ActivationPhase {
        match self.activation.phase() {
            ActivationPhase::Idle if self.active.is_some() => ActivationPhase::Active,
            phase => phase,
        }
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn auth_error(&self) -> Option<&str> {
        self.auth_error.as_deref()
    }

    /// Allocate a ticket for an activation request
    pub fn issue_ticket(&mut self) -> Ticket {
        self.activation.issue()
    }

    /// Ask for a room-list refresh unless one is already in flight
    pub fn request_rooms(&mut self) -> Vec<Effect> {
        if self.rooms_refresh_pending {
            return Vec::new();
        }
        self.rooms_refresh_pending = true;
        vec![Effect::RefreshRooms]
    }

    /// Apply one event.
    ///
    /// # Errors
    /// Local actions that fail validation return a `DomainError` and leave
    /// the state untouched.
    pub fn reduce(&mut self, event: SyncEvent) -> Result<Vec<Effect>, DomainError> {
        let effects = match event {
            SyncEvent::RoomsLoaded(rooms) => self.on_rooms_loaded(rooms),
            SyncEvent::RoomsFailed(error) => {
                tracing::warn!(error = %error, "Room list refresh failed");
                self.rooms_refresh_pending = false;
                Vec::new()
            }
            SyncEvent::HistoryLoaded {
                ticket,
                room_id,
                messages,
            } => self.on_history_loaded(ticket, room_id, messages),
            SyncEvent::HistoryFailed {
                ticket,
                room_id,
                error,
            } => self.on_history_failed(ticket, &room_id, error),
            SyncEvent::RoomCreated { room, ticket } => {
                let room_id = room.id.clone();
                let existed = self.directory.upsert_front(room);
                tracing::debug!(room_id = %room_id, existed, "Room created");
                self.activate(room_id, ticket)?
            }
            SyncEvent::Connected { at } => self.on_connected(at),
            SyncEvent::Disconnected { reason, at } => {
                tracing::info!(reason = %reason, "Disconnected, keeping cached state");
                self.connection = ConnectionState::Disconnected;
                self.disconnected_at.get_or_insert(at);
                self.joined = None;
                Vec::new()
            }
            SyncEvent::AuthError { reason } => {
                self.connection = ConnectionState::Error;
                self.auth_error = Some(reason);
                self.joined = None;
                Vec::new()
            }
            SyncEvent::NewMessage(event) => self.on_new_message(event),
            SyncEvent::ReactionUpdated(event) => {
                self.on_reaction_updated(&event);
                Vec::new()
            }
            SyncEvent::UserOnline(user_id) => {
                self.directory.set_presence(&user_id, UserStatus::Online);
                Vec::new()
            }
            SyncEvent::UserOffline(user_id) => {
                self.directory.set_presence(&user_id, UserStatus::Offline);
                Vec::new()
            }
            SyncEvent::Typing(event) => {
                if self.active.as_ref() == Some(&event.room_id) && event.user_id != self.current_user
                {
                    self.store.set_typing(&event.user_id, event.is_typing);
                }
                Vec::new()
            }
            SyncEvent::ActivateRequested { room_id, ticket } => self.activate(room_id, ticket)?,
            SyncEvent::SendRequested(request) => {
                let room_id = self.require_active()?;
                request.ensure_valid()?;
                vec![Effect::Signal(OutboundSignal::SendMessage(SendMessageCommand {
                    room_id,
                    message: request,
                }))]
            }
            SyncEvent::ReactRequested { message_id, emoji } => {
                self.require_active()?;
                let emoji = normalize_emoji(&emoji)?.to_string();
                if !self.store.contains(&message_id) {
                    return Err(DomainError::MessageNotFound(message_id));
                }
                vec![Effect::Signal(OutboundSignal::AddReaction(AddReactionCommand {
                    message_id,
                    emoji,
                }))]
            }
            SyncEvent::TypingRequested { is_typing } => {
                let room_id = self.require_active()?;
                vec![Effect::Signal(OutboundSignal::Typing(TypingCommand {
                    room_id,
                    is_typing,
                }))]
            }
            SyncEvent::IdentityCleared => self.on_identity_cleared(),
        };
        Ok(effects)
    }

    fn require_active(&self) -> Result<RoomId, DomainError> {
        self.active.clone().ok_or(DomainError::NoActiveRoom)
    }

    /// Subscribe to `room_id` if connected and not already subscribed.
    ///
    /// At most one room is joined; any other subscription is left first.
    fn join(&mut self, room_id: &RoomId, effects: &mut Vec<Effect>) {
        if !self.connection.is_connected() || self.joined.as_ref() == Some(room_id) {
            return;
        }
        self.leave(effects);
        effects.push(Effect::Signal(OutboundSignal::JoinRoom(room_id.clone())));
        self.joined = Some(room_id.clone());
    }

    fn leave(&mut self, effects: &mut Vec<Effect>) {
        if let Some(room_id) = self.joined.take() {
            effects.push(Effect::Signal(OutboundSignal::LeaveRoom(room_id)));
        }
    }

    // === Room activation ===

    fn activate(&mut self, room_id: RoomId, ticket: Ticket) -> Result<Vec<Effect>, DomainError> {
        if !self.directory.contains(&room_id) {
            return Err(DomainError::RoomNotFound(room_id));
        }

        let mut effects = Vec::new();
        if self.active.as_ref() == Some(&room_id) && self.activation.pending().is_none() {
            tracing::debug!(room_id = %room_id, ticket = %ticket, "Room already active");
            self.directory.mark_read(&room_id);
            self.join(&room_id, &mut effects);
            effects.push(Effect::MarkRead {
                room_id: room_id.clone(),
            });
            effects.push(Effect::ActivationSettled {
                ticket,
                result: Ok(ActivationOutcome::Activated(room_id)),
            });
            return Ok(effects);
        }

        self.begin_activation(room_id, ticket, &mut effects);
        Ok(effects)
    }

    fn begin_activation(&mut self, target: RoomId, ticket: Ticket, effects: &mut Vec<Effect>) {
        let pending = PendingActivation {
            ticket,
            target: target.clone(),
            previous: self.active.clone(),
            phase: ActivationPhase::Leaving,
        };
        if let Some(superseded) = self.activation.begin(pending) {
            tracing::debug!(
                ticket = %superseded.ticket,
                room_id = %superseded.target,
                "Activation superseded"
            );
            effects.push(Effect::ActivationSettled {
                ticket: superseded.ticket,
                result: Ok(ActivationOutcome::Superseded),
            });
        }

        if self.joined.as_ref().is_some_and(|joined| joined != &target) {
            self.leave(effects);
        }

        self.activation.advance(ActivationPhase::Hydrating);
        tracing::debug!(room_id = %target, ticket = %ticket, "Hydrating room");
        effects.push(Effect::FetchHistory {
            room_id: target,
            ticket,
        });
    }

    fn on_history_loaded(
        &mut self,
        ticket: Ticket,
        room_id: RoomId,
        messages: Vec<ChatMessage>,
    ) -> Vec<Effect> {
        if !self.activation.matches(ticket, &room_id) {
            tracing::debug!(ticket = %ticket, room_id = %room_id, "Stale history response dropped");
            return Vec::new();
        }

        let mut effects = Vec::new();
        self.activation.advance(ActivationPhase::Subscribing);
        self.store = MessageStore::hydrate(room_id.clone(), messages);
        self.directory.mark_read(&room_id);
        effects.push(Effect::MarkRead {
            room_id: room_id.clone(),
        });
        self.join(&room_id, &mut effects);

        self.activation.advance(ActivationPhase::Active);
        self.activation.finish();
        self.active = Some(room_id.clone());
        tracing::info!(
            room_id = %room_id,
            ticket = %ticket,
            messages = self.store.len(),
            "Room active"
        );

        effects.push(Effect::ActivationSettled {
            ticket,
            result: Ok(ActivationOutcome::Activated(room_id)),
        });
        effects
    }

    fn on_history_failed(
        &mut self,
        ticket: Ticket,
        room_id: &RoomId,
        error: DomainError,
    ) -> Vec<Effect> {
        if !self.activation.matches(ticket, room_id) {
            tracing::debug!(ticket = %ticket, room_id = %room_id, "Stale history failure dropped");
            return Vec::new();
        }

        let mut effects = Vec::new();
        let failed = self.activation.finish();
        tracing::warn!(
            room_id = %room_id,
            ticket = %ticket,
            previous = ?failed.and_then(|p| p.previous),
            error = %error,
            "Activation failed, previous room stays active"
        );

        if let Some(active) = self.active.clone() {
            self.join(&active, &mut effects);
        }
        effects.push(Effect::ActivationSettled {
            ticket,
            result: Err(error),
        });
        effects
    }

    // === Connection ===

    fn on_connected(&mut self, at: DateTime<Utc>) -> Vec<Effect> {
        self.connection = ConnectionState::Connected;
        self.auth_error = None;

        let Some(since) = self.disconnected_at.take() else {
            return Vec::new();
        };

        let mut effects = Vec::new();
        // a pending activation joins its target when history commits
        let rejoin = self.active.clone().filter(|_| self.activation.pending().is_none());
        if let Some(active) = rejoin {
            self.join(&active, &mut effects);
        }

        let gap_exceeded = (at - since)
            .to_std()
            .is_ok_and(|gap| gap > self.policy.rehydrate_after);
        tracing::info!(
            gap_ms = (at - since).num_milliseconds(),
            rehydrate = gap_exceeded,
            "Reconnected"
        );

        if gap_exceeded {
            if let Some(active) = self.active.clone() {
                if self.activation.pending().is_none() {
                    let ticket = self.activation.issue();
                    self.begin_activation(active, ticket, &mut effects);
                }
            }
            effects.extend(self.request_rooms());
        }
        effects
    }

    // === Push ===

    fn on_rooms_loaded(&mut self, rooms: Vec<ChatRoom>) -> Vec<Effect> {
        self.rooms_refresh_pending = false;
        self.directory.replace(rooms);
        tracing::debug!(rooms = self.directory.len(), "Room list loaded");

        let mut effects = Vec::new();
        if let Some(active) = self.active.clone() {
            if self.directory.contains(&active) {
                self.directory.mark_read(&active);
            } else {
                tracing::info!(room_id = %active, "Active room no longer listed");
                self.leave(&mut effects);
                self.active = None;
                self.store = MessageStore::new();
            }
        }
        effects
    }

    fn on_new_message(&mut self, event: NewMessageEvent) -> Vec<Effect> {
        let NewMessageEvent {
            room_id,
            mut message,
        } = event;
        if message.room_id != room_id {
            tracing::debug!(
                room_id = %room_id,
                message_room_id = %message.room_id,
                "Message room mismatch, using event room"
            );
            message.room_id = room_id.clone();
        }

        let is_active = self.active.as_ref() == Some(&room_id);
        if is_active && self.store.contains(&message.id) {
            tracing::trace!(message_id = %message.id, "Duplicate message ignored");
            return Vec::new();
        }

        let count_unread = !is_active && message.sender_id != self.current_user;
        let known = self.directory.record_message(&message, count_unread);
        if is_active {
            self.store.append(message);
        }

        if known.is_none() {
            tracing::debug!(room_id = %room_id, "Message for unknown room, refreshing room list");
            return self.request_rooms();
        }
        Vec::new()
    }

    fn on_reaction_updated(&mut self, event: &ReactionUpdatedEvent) {
        if event
            .room_id
            .as_ref()
            .is_some_and(|room_id| Some(room_id) != self.active.as_ref())
        {
            return;
        }

        match self
            .store
            .apply_reaction(&event.message_id, &event.user_id, &event.emoji, event.action)
        {
            Some(changed) => tracing::trace!(
                message_id = %event.message_id,
                emoji = %event.emoji,
                changed,
                "Reaction applied"
            ),
            None => tracing::trace!(
                message_id = %event.message_id,
                "Reaction for message outside the active room ignored"
            ),
        }
    }

    fn on_identity_cleared(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(pending) = self.activation.finish() {
            effects.push(Effect::ActivationSettled {
                ticket: pending.ticket,
                result: Ok(ActivationOutcome::Superseded),
            });
        }
        let activation = self.activation.clone();
        *self = Self::new(self.current_user.clone(), self.policy);
        // keep tickets unique across the reset
        self.activation = activation;
        tracing::info!("Chat state cleared");
        effects
    }
}
