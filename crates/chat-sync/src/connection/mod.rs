//! Connection management
//!
//! The persistent push connection: lifecycle state, handshake, heartbeat,
//! reconnect backoff and the handle used to send signals.

mod backoff;
mod handle;
mod manager;
mod state;
mod transport;

pub use backoff::ReconnectPolicy;
pub use handle::ConnectionHandle;
pub use manager::{ConnectionConfig, ConnectionManager};
pub use state::{ConnectionEvent, ConnectionState, DisconnectReason};
