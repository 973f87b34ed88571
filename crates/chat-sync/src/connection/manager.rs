//! Connection manager
//!
//! Opens the push connection and hands the socket to a background transport task.

use std::sync::Arc;
use std::time::Duration;

use chat_common::{AppError, AppResult, ClientConfig};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

use super::handle::ConnectionHandle;
use super::transport::{establish, Transport};
use super::{ConnectionEvent, ConnectionState, ReconnectPolicy};
use crate::protocol::IdentifyPayload;

/// Connection settings
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket base URL, without the namespace
    pub gateway_url: String,
    /// Bound on connect plus identify
    pub connect_timeout: Duration,
    pub reconnect: ReconnectPolicy,
    /// Outbound queue capacity
    pub buffer: usize,
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            connect_timeout: Duration::from_secs(10),
            reconnect: ReconnectPolicy::default(),
            buffer: 256,
        }
    }

    #[must_use]
    pub fn from_client_config(config: &ClientConfig) -> Self {
        Self {
            gateway_url: config.endpoints.gateway_url.clone(),
            connect_timeout: config.timeouts.connect,
            reconnect: config.reconnect.into(),
            buffer: config.sync.event_buffer,
        }
    }

    fn namespace_url(&self, namespace: &str) -> String {
        format!(
            "{}/{}",
            self.gateway_url.trim_end_matches('/'),
            namespace.trim_matches('/')
        )
    }
}

/// Owns the connection state and emits connection events into a sink
pub struct ConnectionManager {
    config: ConnectionConfig,
    state: Arc<watch::Sender<ConnectionState>>,
    events: mpsc::Sender<ConnectionEvent>,
}

impl ConnectionManager {
    /// Create a manager whose events go to `events`
    #[must_use]
    pub fn new(config: ConnectionConfig, events: mpsc::Sender<ConnectionEvent>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            state: Arc::new(state),
            events,
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Connect and identify
    ///
    /// Emits `Connected` before returning; the transport task keeps the
    /// connection alive afterwards.
    ///
    /// # Errors
    /// - `Authentication` if the token is empty or rejected
    /// - `Network` if the transport cannot be established
    /// - `Timeout` if no READY arrives within the connect timeout
    pub async fn connect(&self, token: &str, namespace: &str) -> AppResult<ConnectionHandle> {
        if token.trim().is_empty() {
            self.state.send_replace(ConnectionState::Error);
            return Err(AppError::authentication("no token available"));
        }

        let url = self.config.namespace_url(namespace);
        let identify = IdentifyPayload::new(token, namespace);
        self.state.send_replace(ConnectionState::Connecting);
        tracing::debug!(url = %url, "Connecting");

        let established = match timeout(self.config.connect_timeout, establish(&url, &identify)).await
        {
            Ok(Ok(established)) => established,
            Ok(Err(e)) => {
                tracing::warn!(url = %url, error = %e, "Connect failed");
                self.state.send_replace(ConnectionState::Error);
                return Err(e.into());
            }
            Err(_) => {
                tracing::warn!(url = %url, "Connect timed out");
                self.state.send_replace(ConnectionState::Error);
                return Err(AppError::Timeout("connect"));
            }
        };

        let ready = established.ready.clone();
        let (outbound_tx, outbound_rx) = mpsc::channel(self.config.buffer);
        let handle = ConnectionHandle::new(outbound_tx, self.state.subscribe());

        self.state.send_replace(ConnectionState::Connected);
        tracing::info!(
            session_id = %ready.session_id,
            user_id = %ready.user_id,
            "Connected"
        );

        self.events
            .send(ConnectionEvent::Connected {
                session_id: ready.session_id,
                user_id: ready.user_id,
            })
            .await
            .map_err(|_| AppError::internal(anyhow::anyhow!("connection event receiver dropped")))?;

        let transport = Transport {
            url,
            identify,
            policy: self.config.reconnect,
            connect_timeout: self.config.connect_timeout,
            state: Arc::clone(&self.state),
            events: self.events.clone(),
            outbound: outbound_rx,
        };
        tokio::spawn(transport.run(established));

        Ok(handle)
    }
}
