//! muster-core — wire format, chat message type, and configuration.
//! All other Muster crates depend on this one.

pub mod config;
pub mod message;
pub mod wire;

pub use message::ChatMessage;
pub use wire::{Frame, PeerEntry, PeerId, WireError};
