//! Error types for the lobby layer.

use greenroom_protocol::{ParticipantId, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room has no free slots.
    #[error("room {0} is full")]
    Full(RoomId),

    /// The room is mid-round and not accepting joins.
    #[error("room {0} is not joinable")]
    NotJoinable(RoomId),

    /// The participant is already in a room.
    #[error("participant {0} already in room {1}")]
    AlreadyJoined(ParticipantId, RoomId),

    /// The participant is not in any room.
    #[error("participant {0} is not in a room")]
    NotInRoom(ParticipantId),

    /// The room's command channel is closed (actor has exited).
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
