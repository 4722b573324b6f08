//! The per-session actor and its supporting state

pub mod coordinator;
pub mod outbox;
pub mod players;
pub mod registry;
pub mod scoring;
pub mod snapshot;

pub use coordinator::{Room, RoomCommand, RoomHandle};
pub use registry::RoomRegistry;
