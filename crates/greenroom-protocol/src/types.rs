//! Core protocol types for Greenroom's wire format.
//!
//! Everything in this module travels "on the wire": these structures are
//! serialized to bytes, sent over the network, and deserialized on the
//! other side. The JSON shapes documented here are the contract with
//! client SDKs, so the serde attributes are load-bearing.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a participant.
///
/// A newtype wrapper around `u64`, so a `RoomId` can never be passed
/// where a `ParticipantId` is expected even though both are `u64`
/// underneath.
///
/// `#[serde(transparent)]` makes this serialize as the bare number:
/// `ParticipantId(42)` becomes `42` in JSON, not `{ "0": 42 }`. Client
/// SDKs expect a plain number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

/// Display gives log lines like "participant P-42 joined".
impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room.
///
/// Same newtype pattern as [`ParticipantId`]. A room is one lobby plus
/// the rounds played out of it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Room status
// ---------------------------------------------------------------------------

/// The two phases a room cycles between.
///
/// Serialized lowercase (`"lobby"`, `"playing"`) because that is how the
/// status appears inside `lobbyUpdate` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Gathering participants and readiness. Joinable.
    Lobby,
    /// A round is in progress. Not joinable.
    Playing,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::Playing => write!(f, "playing"),
        }
    }
}

// ---------------------------------------------------------------------------
// Roster entries
// ---------------------------------------------------------------------------

/// One participant as seen in a `lobbyUpdate` roster.
///
/// The `host` flag is derived server-side: exactly one member of a
/// non-empty roster carries `host: true`, and it is always the earliest
/// joiner still present. Clients must not cache it across updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberEntry {
    /// The participant's unique ID.
    pub id: ParticipantId,
    /// Display color assigned at registration (hex string like "#e6194b").
    pub color: String,
    /// Whether this participant has declared readiness.
    pub ready: bool,
    /// Whether this participant is the current host.
    pub host: bool,
}

// ---------------------------------------------------------------------------
// Client → Server messages
// ---------------------------------------------------------------------------

/// Messages a client sends to the coordinator.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, and
/// `rename_all = "camelCase"` gives the tags their wire names:
///
/// ```json
/// { "type": "ready" }
/// { "type": "startGame" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Flip the sender's readiness flag. Carries no payload — the
    /// sender's identity is implicit from the connection, and the
    /// server holds the current flag.
    Ready,

    /// Host-only request to start the round before everyone is ready.
    StartGame,
}

// ---------------------------------------------------------------------------
// Server → Client messages
// ---------------------------------------------------------------------------

/// Messages the coordinator sends to clients.
///
/// Same tagging scheme as [`ClientMessage`]. The wire shapes:
///
/// ```json
/// { "type": "init", "participant_id": 3, "color": "#e6194b", "host": false }
/// { "type": "lobbyUpdate", "status": "lobby", "members": [ ... ] }
/// { "type": "gameStart" }
/// { "type": "gameEnd" }
/// { "type": "denied", "code": 403, "reason": "only the host may start" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// First message after joining: tells the client who it is.
    Init {
        /// The ID assigned to this participant.
        participant_id: ParticipantId,
        /// The display color assigned to this participant.
        color: String,
        /// Whether this participant joined as host.
        host: bool,
    },

    /// Full roster snapshot. Sent to every member after any membership
    /// or readiness change, and on phase transitions. Members appear in
    /// join order.
    LobbyUpdate {
        status: RoomStatus,
        members: Vec<MemberEntry>,
    },

    /// The round has started.
    GameStart,

    /// The round has ended; the room is back in the lobby.
    GameEnd,

    /// A request was rejected. `code` follows HTTP-style conventions
    /// (403 = not allowed for you, 409 = wrong state).
    Denied { code: u16, reason: String },
}

// ---------------------------------------------------------------------------
// Envelope — the top-level wire format
// ---------------------------------------------------------------------------

/// The top-level wrapper around every server-sent message.
///
/// ```json
/// { "seq": 7, "timestamp": 15000, "message": { "type": "gameStart" } }
/// ```
///
/// `seq` is a per-room counter stamped at broadcast time, so two clients
/// in the same room can compare what they have seen. `timestamp` is
/// milliseconds since the room was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<M> {
    /// Per-room monotonic sequence number.
    pub seq: u64,

    /// Milliseconds since the room was created.
    pub timestamp: u64,

    /// The actual message content.
    pub message: M,
}

// =========================================================================
// Tests
// =========================================================================
