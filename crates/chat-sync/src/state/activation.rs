//! Room activation bookkeeping
//!
//! One activation may be in flight at a time. Each carries a ticket; a
//! history response is accepted only while its ticket and room still match
//! the pending activation.

use chat_core::RoomId;
use std::fmt;

/// Identifies one activation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Activation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationPhase {
    #[default]
    Idle,
    /// Unsubscribing from the previous room
    Leaving,
    /// Waiting for the history page
    Hydrating,
    /// History committed, subscribe signal going out
    Subscribing,
    Active,
}

/// How an activation ended, when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    Activated(RoomId),
    /// A newer activation replaced this one before its history arrived
    Superseded,
}

/// An activation waiting for its history page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingActivation {
    pub ticket: Ticket,
    pub target: RoomId,
    /// Active room when the activation began; stays active on failure
    pub previous: Option<RoomId>,
    pub phase: ActivationPhase,
}

/// Ticket source plus the single in-flight activation
#[derive(Debug, Clone, Default)]
pub struct ActivationTracker {
    next_ticket: u64,
    pending: Option<PendingActivation>,
}

impl ActivationTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh ticket
    pub fn issue(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    pub fn pending(&self) -> Option<&PendingActivation> {
        self.pending.as_ref()
    }

    pub fn phase(&self) -> ActivationPhase {
        self.pending
            .as_ref()
            .map_or(ActivationPhase::Idle, |p| p.phase)
    }

    /// Start tracking `activation`, returning the one it supersedes
    pub fn begin(&mut self, activation: PendingActivation) -> Option<PendingActivation> {
        self.pending.replace(activation)
    }

    pub fn advance(&mut self, phase: ActivationPhase) {
        if let Some(pending) = self.pending.as_mut() {
            pending.phase = phase;
        }
    }

    /// Does a response for (`ticket`, `room_id`) belong to the pending activation?
    pub fn matches(&self, ticket: Ticket, room_id: &RoomId) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| p.ticket == ticket && &p.target == room_id)
    }

    /// Stop tracking the pending activation
    pub fn finish(&mut self) -> Option<PendingActivation> {
        self.pending.take()
    }
}
