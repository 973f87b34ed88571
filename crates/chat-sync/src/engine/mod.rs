//! Sync engine
//!
//! A single task owns the chat state. Clients talk to it through
//! [`ChatClient`] and observe it through [`ChatSnapshot`].

mod client;
mod command;
mod runner;
mod snapshot;

pub use client::ChatClient;
pub use runner::{EngineSettings, SyncEngine};
pub use snapshot::ChatSnapshot;
