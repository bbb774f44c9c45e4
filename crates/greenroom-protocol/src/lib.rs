//! Wire protocol for Greenroom.
//!
//! This crate defines the language that clients and the coordinator speak:
//!
//! - **Types** ([`Envelope`], [`ClientMessage`], [`ServerMessage`],
//!   [`MemberEntry`], the ID newtypes) — the structures that travel on
//!   the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during encoding
//!   and decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the lobby
//! (room state). It knows nothing about connections or rooms, only how
//! to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Lobby (room state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, Envelope, MemberEntry, ParticipantId, RoomId, RoomStatus,
    ServerMessage,
};
