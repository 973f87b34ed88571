//! Session wiring
//!
//! Connects the push channel for an authenticated user and starts the sync
//! engine on top of it.

use std::fmt;
use std::sync::Arc;

use chat_common::{AppResult, ClientConfig};
use chat_core::{ChatApi, UserId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::RestChatApi;
use crate::connection::{ConnectionConfig, ConnectionHandle, ConnectionManager, ConnectionState};
use crate::engine::{ChatClient, EngineSettings, SyncEngine};

/// The signed-in user
#[derive(Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub auth_token: String,
}

impl Identity {
    pub fn new(user_id: impl Into<UserId>, auth_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            auth_token: auth_token.into(),
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// A running chat session for one identity
#[derive(Debug)]
pub struct ChatSession {
    user_id: UserId,
    client: ChatClient,
    connection: ConnectionHandle,
    engine: JoinHandle<()>,
}

impl ChatSession {
    /// Start a session against the REST endpoint named in `config`
    ///
    /// # Errors
    /// See [`ChatSession::start`]
    pub async fn connect(identity: Identity, config: &ClientConfig) -> AppResult<Self> {
        let api = RestChatApi::new(
            config.endpoints.api_url.as_str(),
            identity.auth_token.as_str(),
            config.timeouts.request,
        )?;
        Self::start(identity, config, Arc::new(api)).await
    }

    /// Connect the push channel and start the engine
    ///
    /// The engine loads the room list as soon as it starts.
    ///
    /// # Errors
    /// `Authentication` if the token is missing or rejected, `Network` or
    /// `Timeout` if the gateway cannot be reached.
    pub async fn start(
        identity: Identity,
        config: &ClientConfig,
        api: Arc<dyn ChatApi>,
    ) -> AppResult<Self> {
        let (events_tx, events_rx) = mpsc::channel(config.sync.event_buffer.max(1));
        let manager = ConnectionManager::new(ConnectionConfig::from_client_config(config), events_tx);
        let connection = manager
            .connect(&identity.auth_token, &config.endpoints.namespace)
            .await?;

        let (engine, client) = SyncEngine::new(
            identity.user_id.clone(),
            api,
            connection.clone(),
            events_rx,
            EngineSettings::from_client_config(config),
        );
        let engine = tokio::spawn(engine.run());
        tracing::info!(user_id = %identity.user_id, "Chat session started");

        Ok(Self {
            user_id: identity.user_id,
            client,
            connection,
            engine,
        })
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn client(&self) -> ChatClient {
        self.client.clone()
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Clear state, close the connection and wait for the engine to stop
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        self.connection.disconnect().await;
        if let Err(e) = self.engine.await {
            tracing::warn!(error = %e, "Sync engine task failed");
        }
        tracing::info!(user_id = %self.user_id, "Chat session closed");
    }
}
