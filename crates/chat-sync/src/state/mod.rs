//! Client-side chat state
//!
//! Pure data structures plus the reducer that drives them. Nothing in here
//! touches the network or the runtime.

mod activation;
mod directory;
mod reducer;
mod store;

pub use activation::{
    ActivationOutcome, ActivationPhase, ActivationTracker, PendingActivation, Ticket,
};
pub use directory::RoomDirectory;
pub use reducer::{Effect, SyncEvent, SyncPolicy, SyncState};
pub use store::{DateGroup, MessageStore, ReplyTarget, StoredMessage};
