//! Lobby coordination for Greenroom.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns the
//! lobby state machine: an insertion-ordered roster with readiness flags
//! and join-order host succession, the `lobby` ⇄ `playing` cycle, the
//! auto-start grace countdown, and fan-out of every state change to all
//! connected members.
//!
//! # Key types
//!
//! - [`RoomManager`] — opens rooms, places participants, routes requests
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`Roster`] — ordered membership with derived host
//! - [`RoomConfig`] — quorum, capacity, grace window, round limit
//!
//! # Concurrency model
//!
//! All mutations for a room are serialized through its command channel —
//! one logical writer per room, no locks inside a room, rooms fully
//! independent of each other. The grace countdown is a branch on the
//! actor's `select!` loop, so cancelling it is a plain field write and
//! the start condition is re-validated at fire time.

mod config;
mod error;
mod manager;
mod room;
mod roster;

pub use config::RoomConfig;
pub use error::LobbyError;
pub use manager::RoomManager;
pub use room::{ParticipantSender, RoomHandle, RoomSnapshot};
pub use roster::{Member, Roster};
