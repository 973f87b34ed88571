//! The engine task
//!
//! Owns [`SyncState`] and serializes every input through the reducer:
//! client commands, connection events and the results of requests it
//! spawned. Effects are carried out here.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chat_common::{AppError, AppResult, ClientConfig};
use chat_core::{ApiResult, ChatApi, DomainError, UserId};
use chrono::Utc;
use tokio::sync::{mpsc, watch};

use super::command::{Command, Completion, Reply};
use super::{ChatClient, ChatSnapshot};
use crate::connection::{ConnectionEvent, ConnectionHandle};
use crate::state::{ActivationOutcome, Effect, SyncEvent, SyncPolicy, SyncState, Ticket};

/// Engine tuning
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Page size of a history fetch
    pub history_limit: u32,
    pub request_timeout: Duration,
    pub policy: SyncPolicy,
    pub command_buffer: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            history_limit: 50,
            request_timeout: Duration::from_secs(10),
            policy: SyncPolicy::default(),
            command_buffer: 64,
        }
    }
}

impl EngineSettings {
    #[must_use]
    pub fn from_client_config(config: &ClientConfig) -> Self {
        Self {
            history_limit: config.sync.history_limit,
            request_timeout: config.timeouts.request,
            policy: SyncPolicy {
                rehydrate_after: config.sync.rehydrate_after,
            },
            command_buffer: config.sync.event_buffer,
        }
    }
}

/// Bound a chat API call by `limit`
pub(crate) async fn with_timeout<T>(
    limit: Duration,
    what: &'static str,
    call: impl Future<Output = ApiResult<T>>,
) -> ApiResult<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| DomainError::TimedOut(what))?
}

/// Single-owner task driving the chat state
pub struct SyncEngine {
    state: SyncState,
    api: Arc<dyn ChatApi>,
    connection: ConnectionHandle,
    settings: EngineSettings,
    commands: mpsc::Receiver<Command>,
    events: mpsc::Receiver<ConnectionEvent>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    activations: HashMap<Ticket, Reply<ActivationOutcome>>,
    room_refreshes: Vec<Reply<()>>,
    snapshot: watch::Sender<ChatSnapshot>,
}

impl SyncEngine {
    /// Build the engine and the client that talks to it
    pub fn new(
        current_user: UserId,
        api: Arc<dyn ChatApi>,
        connection: ConnectionHandle,
        events: mpsc::Receiver<ConnectionEvent>,
        settings: EngineSettings,
    ) -> (Self, ChatClient) {
        let (commands_tx, commands) = mpsc::channel(settings.command_buffer.max(1));
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let state = SyncState::new(current_user, settings.policy);
        let (snapshot, snapshot_rx) = watch::channel(ChatSnapshot::capture(&state));

        let client = ChatClient::new(
            commands_tx,
            Arc::clone(&api),
            snapshot_rx,
            settings.request_timeout,
        );
        let engine = Self {
            state,
            api,
            connection,
            settings,
            commands,
            events,
            completions_tx,
            completions,
            activations: HashMap::new(),
            room_refreshes: Vec::new(),
            snapshot,
        };
        (engine, client)
    }

    /// Run until shut down or every client is dropped
    pub async fn run(mut self) {
        tracing::debug!(user_id = %self.state.current_user(), "Sync engine started");
        let effects = self.state.request_rooms();
        self.execute(effects);
        self.publish();

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.on_command(command),
                },
                Some(event) = self.events.recv() => self.on_connection_event(event),
                Some(completion) = self.completions.recv() => self.on_completion(completion),
            }
            self.publish();
        }

        let effects = self.step(SyncEvent::IdentityCleared);
        self.execute(effects);
        self.publish();
        tracing::debug!("Sync engine stopped");
    }

    fn publish(&self) {
        let next = ChatSnapshot::capture(&self.state);
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    /// Reduce an event that cannot fail validation
    fn step(&mut self, event: SyncEvent) -> Vec<Effect> {
        self.state.reduce(event).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Event rejected");
            Vec::new()
        })
    }

    // === Inputs ===

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Activate { room_id, reply } => {
                let ticket = self.state.issue_ticket();
                tracing::debug!(room_id = %room_id, ticket = %ticket, "Activation requested");
                match self
                    .state
                    .reduce(SyncEvent::ActivateRequested { room_id, ticket })
                {
                    Ok(effects) => {
                        self.activations.insert(ticket, reply);
                        self.execute(effects);
                    }
                    Err(e) => respond(reply, Err(e.into())),
                }
            }
            Command::Send { request, reply } => {
                let result = self.submit(SyncEvent::SendRequested(request));
                respond(reply, result);
            }
            Command::React {
                message_id,
                emoji,
                reply,
            } => {
                let result = self.submit(SyncEvent::ReactRequested { message_id, emoji });
                respond(reply, result);
            }
            Command::Typing { is_typing, reply } => {
                let result = self.submit(SyncEvent::TypingRequested { is_typing });
                respond(reply, result);
            }
            Command::CreateRoom { request, reply } => {
                let request = match request.normalized(self.state.current_user()) {
                    Ok(request) => request,
                    Err(e) => return respond(reply, Err(e.into())),
                };
                let api = Arc::clone(&self.api);
                let limit = self.settings.request_timeout;
                self.spawn(async move {
                    let result = with_timeout(limit, "create room", api.create_room(&request)).await;
                    Completion::Created { result, reply }
                });
            }
            Command::RefreshRooms { reply } => {
                self.room_refreshes.push(reply);
                let effects = self.state.request_rooms();
                self.execute(effects);
            }
            Command::Shutdown => {}
        }
    }

    fn on_connection_event(&mut self, event: ConnectionEvent) {
        let event = match event {
            ConnectionEvent::Connected {
                session_id,
                user_id,
            } => {
                if &user_id != self.state.current_user() {
                    tracing::warn!(
                        session_id = %session_id,
                        user_id = %user_id,
                        expected = %self.state.current_user(),
                        "READY for a different user"
                    );
                }
                SyncEvent::Connected { at: Utc::now() }
            }
            ConnectionEvent::Disconnected(reason) => SyncEvent::Disconnected {
                reason,
                at: Utc::now(),
            },
            ConnectionEvent::AuthError { reason } => SyncEvent::AuthError { reason },
            ConnectionEvent::Push(event) => {
                tracing::trace!(event = event.event_type(), "Push event");
                SyncEvent::from(event)
            }
        };
        let effects = self.step(event);
        self.execute(effects);
    }

    fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::History {
                ticket,
                room_id,
                result,
            } => {
                let event = match result {
                    Ok(messages) => SyncEvent::HistoryLoaded {
                        ticket,
                        room_id,
                        messages,
                    },
                    Err(error) => SyncEvent::HistoryFailed {
                        ticket,
                        room_id,
                        error,
                    },
                };
                let effects = self.step(event);
                self.execute(effects);
            }
            Completion::Rooms(result) => {
                let (event, outcome) = match result {
                    Ok(rooms) => (SyncEvent::RoomsLoaded(rooms), Ok(())),
                    Err(e) => (SyncEvent::RoomsFailed(e.clone()), Err(e)),
                };
                let effects = self.step(event);
                self.execute(effects);
                self.publish();
                for reply in self.room_refreshes.drain(..) {
                    respond(reply, outcome.clone().map_err(AppError::from));
                }
            }
            Completion::Created { result, reply } => match result {
                Ok(room) => {
                    let ticket = self.state.issue_ticket();
                    tracing::info!(room_id = %room.id, "Room created");
                    let effects = self.step(SyncEvent::RoomCreated {
                        room: room.clone(),
                        ticket,
                    });
                    self.execute(effects);
                    self.publish();
                    respond(reply, Ok(room));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Room creation failed");
                    respond(reply, Err(e.into()));
                }
            },
        }
    }

    /// Reduce a local action and carry out its effects
    fn submit(&mut self, event: SyncEvent) -> AppResult<()> {
        let effects = self.state.reduce(event)?;
        match self.execute(effects) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // === Effects ===

    /// Carry out `effects`, returning the first signal error
    fn execute(&mut self, effects: Vec<Effect>) -> Option<AppError> {
        let mut signal_error = None;
        for effect in effects {
            match effect {
                Effect::Signal(signal) => {
                    let command = signal.command_type();
                    if let Err(e) = self.connection.send(signal) {
                        tracing::debug!(command = %command, error = %e, "Signal not sent");
                        signal_error.get_or_insert(e);
                    }
                }
                Effect::FetchHistory { room_id, ticket } => {
                    let api = Arc::clone(&self.api);
                    let limit = self.settings.request_timeout;
                    let page = self.settings.history_limit;
                    self.spawn(async move {
                        let result =
                            with_timeout(limit, "history", api.fetch_history(&room_id, page)).await;
                        Completion::History {
                            ticket,
                            room_id,
                            result,
                        }
                    });
                }
                Effect::MarkRead { room_id } => {
                    let api = Arc::clone(&self.api);
                    let limit = self.settings.request_timeout;
                    tokio::spawn(async move {
                        if let Err(e) = with_timeout(limit, "mark read", api.mark_read(&room_id)).await
                        {
                            tracing::debug!(room_id = %room_id, error = %e, "Mark read failed");
                        }
                    });
                }
                Effect::RefreshRooms => {
                    let api = Arc::clone(&self.api);
                    let limit = self.settings.request_timeout;
                    self.spawn(async move {
                        Completion::Rooms(with_timeout(limit, "rooms", api.list_rooms()).await)
                    });
                }
                Effect::ActivationSettled { ticket, result } => {
                    // the requester must observe the committed state
                    self.publish();
                    match self.activations.remove(&ticket) {
                        Some(reply) => respond(reply, result.map_err(AppError::from)),
                        None => tracing::trace!(ticket = %ticket, "Activation settled without waiter"),
                    }
                }
            }
        }
        signal_error
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            // the receiver lives as long as the engine
            let _ = completions.send(task.await);
        });
    }
}

fn respond<T>(reply: Reply<T>, result: AppResult<T>) {
    if reply.send(result).is_err() {
        tracing::trace!("Requester went away before the reply");
    }
}
