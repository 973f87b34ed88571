//! Push protocol op codes
//!
//! Op codes travel as bare integers. The client sends Heartbeat, Identify and
//! Command; everything else arrives from the gateway.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw op code the client does not understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid op code: {0}")]
pub struct UnknownOpCode(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OpCode {
    /// Event dispatch, carries `t` and `s`
    Dispatch,
    /// Keepalive, either direction
    Heartbeat,
    Identify,
    /// Gateway asks the client to reconnect
    Reconnect,
    /// Room subscription, send, react and typing commands
    Command,
    InvalidSession,
    Hello,
    HeartbeatAck,
}

impl OpCode {
    /// Whether the gateway may answer with this op code on its own
    #[must_use]
    pub const fn is_inbound(self) -> bool {
        !matches!(self, Self::Identify | Self::Command)
    }
}

impl TryFrom<u8> for OpCode {
    type Error = UnknownOpCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Dispatch,
            1 => Self::Heartbeat,
            2 => Self::Identify,
            5 => Self::Reconnect,
            6 => Self::Command,
            7 => Self::InvalidSession,
            10 => Self::Hello,
            11 => Self::HeartbeatAck,
            other => return Err(UnknownOpCode(other)),
        })
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        match op {
            OpCode::Dispatch => 0,
            OpCode::Heartbeat => 1,
            OpCode::Identify => 2,
            OpCode::Reconnect => 5,
            OpCode::Command => 6,
            OpCode::InvalidSession => 7,
            OpCode::Hello => 10,
            OpCode::HeartbeatAck => 11,
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?} ({})", u8::from(*self))
    }
}
