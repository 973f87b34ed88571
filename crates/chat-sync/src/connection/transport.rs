//! WebSocket transport
//!
//! Owns the socket: handshake, heartbeat, dispatch decoding and reconnects.

use std::sync::Arc;
use std::time::Duration;

use chat_common::AppError;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::handle::Outbound;
use super::{ConnectionEvent, ConnectionState, DisconnectReason, ReconnectPolicy};
use crate::events::{PushEvent, ReadyEvent};
use crate::protocol::{CloseCode, GatewayMessage, IdentifyPayload, OpCode};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handshake failure
#[derive(Debug, thiserror::Error)]
pub(crate) enum HandshakeError {
    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<HandshakeError> for AppError {
    fn from(err: HandshakeError) -> Self {
        match err {
            HandshakeError::Auth(reason) => Self::Authentication(reason),
            other => Self::Network(other.to_string()),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for HandshakeError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for HandshakeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

/// An identified socket, ready to run
pub(crate) struct Established {
    pub socket: WsStream,
    pub heartbeat: Duration,
    pub ready: ReadyEvent,
}

/// Open the socket and run Hello → Identify → READY
pub(crate) async fn establish(
    url: &str,
    identify: &IdentifyPayload,
) -> Result<Established, HandshakeError> {
    let (mut socket, _) = connect_async(url).await?;

    let first = next_message(&mut socket).await?;
    let hello = first
        .as_hello()
        .ok_or_else(|| HandshakeError::Protocol(format!("expected Hello, got {first}")))?;

    send_message(&mut socket, &GatewayMessage::identify(identify)).await?;

    loop {
        let message = next_message(&mut socket).await?;
        match message.op {
            OpCode::Dispatch => match PushEvent::decode(&message) {
                Ok(Some(PushEvent::Ready(ready))) => {
                    return Ok(Established {
                        socket,
                        heartbeat: hello.interval(),
                        ready,
                    });
                }
                Ok(_) => {
                    tracing::debug!(event = ?message.t, "Dispatch before READY ignored");
                }
                Err(e) => return Err(HandshakeError::Protocol(e.to_string())),
            },
            OpCode::InvalidSession => {
                return Err(HandshakeError::Auth("session rejected".to_string()));
            }
            OpCode::HeartbeatAck | OpCode::Heartbeat => {}
            other => {
                return Err(HandshakeError::Protocol(format!(
                    "unexpected {other} during handshake"
                )));
            }
        }
    }
}

async fn next_message(socket: &mut WsStream) -> Result<GatewayMessage, HandshakeError> {
    while let Some(frame) = socket.next().await {
        match frame? {
            Message::Text(text) => return Ok(GatewayMessage::from_json(&text)?),
            Message::Close(frame) => {
                let (code, reason) = close_details(frame.as_ref());
                if code.and_then(CloseCode::from_u16).is_some_and(CloseCode::is_auth_failure) {
                    return Err(HandshakeError::Auth(reason));
                }
                return Err(HandshakeError::Transport(format!(
                    "closed during handshake: {reason}"
                )));
            }
            Message::Binary(_) => {
                return Err(HandshakeError::Protocol("binary frames not supported".into()));
            }
            _ => {}
        }
    }
    Err(HandshakeError::Transport("connection closed".to_string()))
}

async fn send_message(
    socket: &mut WsStream,
    message: &GatewayMessage,
) -> Result<(), HandshakeError> {
    socket.send(Message::Text(message.to_json()?)).await?;
    Ok(())
}

fn close_details(frame: Option<&CloseFrame<'_>>) -> (Option<u16>, String) {
    match frame {
        Some(frame) => (Some(u16::from(frame.code)), frame.reason.to_string()),
        None => (None, "no close frame".to_string()),
    }
}

/// How a live session ended
#[derive(Debug)]
enum SessionEnd {
    /// Reconnect with backoff
    Lost(DisconnectReason),
    /// Closed with a code that must not be retried
    Terminated(DisconnectReason),
    /// Token rejected
    AuthRejected(String),
    /// `disconnect()` called, or every handle dropped
    ClientClosed,
}

/// What a text frame asks of the session loop
enum Inbound {
    Continue,
    HeartbeatRequested,
    End(SessionEnd),
}

/// Background task owning the socket
pub(crate) struct Transport {
    pub url: String,
    pub identify: IdentifyPayload,
    pub policy: ReconnectPolicy,
    pub connect_timeout: Duration,
    pub state: Arc<watch::Sender<ConnectionState>>,
    pub events: mpsc::Sender<ConnectionEvent>,
    pub outbound: mpsc::Receiver<Outbound>,
}

impl Transport {
    pub(crate) async fn run(mut self, established: Established) {
        let Established {
            mut socket,
            mut heartbeat,
            ready,
        } = established;
        let mut session_id = ready.session_id;

        loop {
            match self.session(&mut socket, heartbeat).await {
                SessionEnd::ClientClosed => {
                    if let Err(e) = socket.close(None).await {
                        tracing::debug!(error = %e, "Close handshake failed");
                    }
                    self.set_state(ConnectionState::Disconnected);
                    tracing::info!(session_id = %session_id, "Connection closed by client");
                    return;
                }
                SessionEnd::AuthRejected(reason) => {
                    tracing::warn!(session_id = %session_id, reason = %reason, "Authentication rejected");
                    self.set_state(ConnectionState::Error);
                    self.emit(ConnectionEvent::AuthError { reason }).await;
                    return;
                }
                SessionEnd::Terminated(reason) => {
                    tracing::warn!(session_id = %session_id, reason = %reason, "Connection terminated");
                    self.set_state(ConnectionState::Error);
                    self.emit(ConnectionEvent::Disconnected(reason)).await;
                    return;
                }
                SessionEnd::Lost(reason) => {
                    tracing::warn!(session_id = %session_id, reason = %reason, "Connection lost");
                    self.set_state(ConnectionState::Disconnected);
                    self.emit(ConnectionEvent::Disconnected(reason)).await;

                    let Some(next) = self.reconnect().await else {
                        return;
                    };
                    socket = next.socket;
                    heartbeat = next.heartbeat;
                    session_id = next.ready.session_id.clone();

                    tracing::info!(session_id = %session_id, "Reconnected");
                    self.set_state(ConnectionState::Connected);
                    self.emit(ConnectionEvent::Connected {
                        session_id: next.ready.session_id,
                        user_id: next.ready.user_id,
                    })
                    .await;
                }
            }
        }
    }

    /// Pump one identified socket until it ends
    async fn session(&mut self, socket: &mut WsStream, heartbeat: Duration) -> SessionEnd {
        let mut ticker = interval_at(Instant::now() + heartbeat, heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut acked = true;
        let mut last_sequence: Option<u64> = None;

        loop {
            tokio::select! {
                frame = socket.next() => {
                    let inbound = match frame {
                        Some(Ok(Message::Text(text))) => {
                            self.on_text(&text, &mut acked, &mut last_sequence).await
                        }
                        Some(Ok(Message::Close(frame))) => Inbound::End(on_close(frame.as_ref())),
                        Some(Ok(Message::Binary(_))) => {
                            tracing::debug!("Binary frame ignored");
                            Inbound::Continue
                        }
                        Some(Ok(_)) => Inbound::Continue,
                        Some(Err(e)) => {
                            Inbound::End(SessionEnd::Lost(DisconnectReason::Transport(e.to_string())))
                        }
                        None => Inbound::End(SessionEnd::Lost(DisconnectReason::Closed {
                            code: None,
                            reason: "stream ended".to_string(),
                        })),
                    };
                    match inbound {
                        Inbound::Continue => {}
                        Inbound::HeartbeatRequested => {
                            if let Err(e) = send_message(socket, &GatewayMessage::heartbeat(last_sequence)).await {
                                return SessionEnd::Lost(DisconnectReason::Transport(e.to_string()));
                            }
                        }
                        Inbound::End(end) => return end,
                    }
                }
                _ = ticker.tick() => {
                    if !acked {
                        tracing::warn!("Connection zombied (heartbeat not ACKed)");
                        return SessionEnd::Lost(DisconnectReason::HeartbeatTimeout);
                    }
                    acked = false;
                    if let Err(e) = send_message(socket, &GatewayMessage::heartbeat(last_sequence)).await {
                        return SessionEnd::Lost(DisconnectReason::Transport(e.to_string()));
                    }
                    tracing::trace!(sequence = ?last_sequence, "Heartbeat sent");
                }
                command = self.outbound.recv() => match command {
                    Some(Outbound::Signal(signal)) => {
                        if let Err(e) = send_message(socket, &signal.to_gateway_message()).await {
                            return SessionEnd::Lost(DisconnectReason::Transport(e.to_string()));
                        }
                        tracing::debug!(
                            command = %signal.command_type(),
                            room_id = ?signal.room_id(),
                            "Signal sent"
                        );
                    }
                    Some(Outbound::Close) | None => return SessionEnd::ClientClosed,
                },
            }
        }
    }

    async fn on_text(
        &self,
        text: &str,
        acked: &mut bool,
        last_sequence: &mut Option<u64>,
    ) -> Inbound {
        let message = match GatewayMessage::from_json(text) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to parse frame");
                return Inbound::Continue;
            }
        };

        match message.op {
            OpCode::Dispatch => {
                if message.s.is_some() {
                    *last_sequence = message.s;
                }
                match PushEvent::decode(&message) {
                    Ok(Some(PushEvent::Chat(event))) => {
                        tracing::trace!(event = event.event_type(), "Dispatch received");
                        self.emit(ConnectionEvent::Push(event)).await;
                    }
                    Ok(Some(PushEvent::Ready(_))) => {
                        tracing::debug!("Duplicate READY ignored");
                    }
                    Ok(None) => {
                        tracing::debug!(event = ?message.t, "Unknown event ignored");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Malformed dispatch dropped");
                    }
                }
                Inbound::Continue
            }
            OpCode::HeartbeatAck => {
                *acked = true;
                Inbound::Continue
            }
            OpCode::Heartbeat => Inbound::HeartbeatRequested,
            OpCode::Reconnect => Inbound::End(SessionEnd::Lost(DisconnectReason::ServerRequested)),
            OpCode::InvalidSession => {
                Inbound::End(SessionEnd::AuthRejected("session invalidated".to_string()))
            }
            other => {
                tracing::debug!(
                    op = %other,
                    inbound = other.is_inbound(),
                    "Unexpected opcode ignored"
                );
                Inbound::Continue
            }
        }
    }

    /// Retry with backoff until identified again, or give up
    async fn reconnect(&mut self) -> Option<Established> {
        let mut attempt = 0;

        loop {
            if self.policy.exhausted(attempt) {
                tracing::warn!(attempts = attempt, "Reconnect attempts exhausted");
                self.set_state(ConnectionState::Error);
                return None;
            }

            let delay = self.policy.delay_for_attempt(attempt);
            attempt += 1;
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");

            if !self.wait(delay).await {
                self.set_state(ConnectionState::Disconnected);
                return None;
            }

            self.set_state(ConnectionState::Connecting);
            match timeout(self.connect_timeout, establish(&self.url, &self.identify)).await {
                Ok(Ok(established)) => return Some(established),
                Ok(Err(HandshakeError::Auth(reason))) => {
                    tracing::warn!(reason = %reason, "Authentication rejected on reconnect");
                    self.set_state(ConnectionState::Error);
                    self.emit(ConnectionEvent::AuthError { reason }).await;
                    return None;
                }
                Ok(Err(e)) => {
                    tracing::debug!(attempt, error = %e, "Reconnect attempt failed");
                }
                Err(_) => {
                    tracing::debug!(attempt, "Reconnect attempt timed out");
                }
            }
            self.set_state(ConnectionState::Disconnected);
        }
    }

    /// Sleep for `delay`; false if the connection was closed meanwhile
    async fn wait(&mut self, delay: Duration) -> bool {
        let deadline = sleep(delay);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                () = &mut deadline => return true,
                command = self.outbound.recv() => match command {
                    Some(Outbound::Signal(signal)) => {
                        tracing::debug!(command = %signal.command_type(), "Signal dropped while reconnecting");
                    }
                    Some(Outbound::Close) | None => return false,
                },
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "Connection state changed");
        }
    }

    async fn emit(&self, event: ConnectionEvent) {
        if self.events.send(event).await.is_err() {
            tracing::trace!("Event receiver dropped");
        }
    }
}

fn on_close(frame: Option<&CloseFrame<'_>>) -> SessionEnd {
    let (code, reason) = close_details(frame);
    let reason = DisconnectReason::Closed { code, reason };

    match code.and_then(CloseCode::from_u16) {
        Some(close) if close.is_auth_failure() => {
            SessionEnd::AuthRejected(close.description().to_string())
        }
        Some(close) if !close.should_reconnect() => SessionEnd::Terminated(reason),
        _ => SessionEnd::Lost(reason),
    }
}
