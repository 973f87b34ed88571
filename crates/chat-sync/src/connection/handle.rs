//! Handle for sending signals through the push connection

use chat_common::{AppError, AppResult};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

use super::ConnectionState;
use crate::events::OutboundSignal;

/// Instruction for the transport task
#[derive(Debug)]
pub(crate) enum Outbound {
    Signal(OutboundSignal),
    Close,
}

/// Cloneable handle to a running connection
///
/// The transport task stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    outbound: mpsc::Sender<Outbound>,
    state: watch::Receiver<ConnectionState>,
}

impl ConnectionHandle {
    pub(crate) fn new(
        outbound: mpsc::Sender<Outbound>,
        state: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self { outbound, state }
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch connection state changes
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected() && !self.outbound.is_closed()
    }

    /// Queue a signal for the server
    ///
    /// Fire-and-forget: success means the signal was queued, not delivered.
    ///
    /// # Errors
    /// `NotConnected` while the connection is down, `Network` if the queue is full
    pub fn send(&self, signal: OutboundSignal) -> AppResult<()> {
        if !self.state().is_connected() {
            tracing::debug!(command = %signal.command_type(), "Signal rejected while disconnected");
            return Err(AppError::NotConnected);
        }

        self.outbound
            .try_send(Outbound::Signal(signal))
            .map_err(|e| match e {
                TrySendError::Full(_) => AppError::network("outbound queue full"),
                TrySendError::Closed(_) => AppError::NotConnected,
            })
    }

    /// Close the connection and stop reconnecting
    pub async fn disconnect(&self) {
        if self.outbound.send(Outbound::Close).await.is_err() {
            tracing::trace!("Connection already stopped");
        }
    }
}
