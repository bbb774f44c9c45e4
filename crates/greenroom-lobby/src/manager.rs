//! Room placement and request routing.

use std::collections::HashMap;

use greenroom_protocol::{ParticipantId, RoomId};

use crate::room::{self, ParticipantSender, RoomHandle, RoomSnapshot};
use crate::{LobbyError, RoomConfig};

/// Command channel depth for each room actor.
const ROOM_CHANNEL_SIZE: usize = 64;

/// Opens rooms, places participants into them, and routes requests to
/// the right room actor.
///
/// The manager owns only the room-id and participant-to-room indexes;
/// all room state lives inside the actors. Placement fills the oldest
/// joinable room first and opens a fresh room when none has a free
/// lobby slot.
pub struct RoomManager {
    config: RoomConfig,
    next_room_id: u64,
    rooms: HashMap<RoomId, RoomHandle>,
    participant_rooms: HashMap<ParticipantId, RoomId>,
}

impl RoomManager {
    /// Creates a manager that opens rooms with the given config.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            next_room_id: 1,
            rooms: HashMap::new(),
            participant_rooms: HashMap::new(),
        }
    }

    /// Places a participant into a room: the oldest joinable room if one
    /// exists, otherwise a freshly opened one. Returns the room they
    /// landed in.
    pub async fn assign(
        &mut self,
        participant_id: ParticipantId,
        color: String,
        sender: ParticipantSender,
    ) -> Result<RoomId, LobbyError> {
        if let Some(room_id) = self.participant_rooms.get(&participant_id) {
            return Err(LobbyError::AlreadyJoined(participant_id, *room_id));
        }

        // Scan existing rooms oldest-first for a free lobby slot. A
        // room can stop being joinable between the snapshot and the
        // join (its round started), so a rejection just moves the scan
        // along.
        let mut room_ids: Vec<RoomId> = self.rooms.keys().copied().collect();
        room_ids.sort();

        for room_id in room_ids {
            let Some(handle) = self.rooms.get(&room_id) else {
                continue;
            };
            let joinable = match handle.snapshot().await {
                Ok(snapshot) => snapshot.is_joinable(),
                Err(_) => {
                    // Actor gone; drop the dead handle.
                    self.rooms.remove(&room_id);
                    continue;
                }
            };
            if !joinable {
                continue;
            }
            match handle
                .join(participant_id, color.clone(), sender.clone())
                .await
            {
                Ok(()) => {
                    self.participant_rooms.insert(participant_id, room_id);
                    return Ok(room_id);
                }
                Err(LobbyError::Full(_))
                | Err(LobbyError::NotJoinable(_))
                | Err(LobbyError::Unavailable(_)) => continue,
                Err(other) => return Err(other),
            }
        }

        // No room had space; open a new one.
        let room_id = self.open_room();
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(LobbyError::NotFound(room_id))?;
        handle.join(participant_id, color, sender).await?;
        self.participant_rooms.insert(participant_id, room_id);
        Ok(room_id)
    }

    /// Removes a participant from their room, if any. Idempotent. The
    /// room is pruned when it empties (its actor exits on its own).
    pub async fn remove(&mut self, participant_id: ParticipantId) {
        let Some(room_id) = self.participant_rooms.remove(&participant_id)
        else {
            return;
        };
        let Some(handle) = self.rooms.get(&room_id) else {
            return;
        };
        match handle.leave(participant_id).await {
            Ok(0) | Err(LobbyError::Unavailable(_)) => {
                self.rooms.remove(&room_id);
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%room_id, %participant_id, error = %err, "leave failed");
            }
        }
    }

    /// Flips a participant's readiness flag in their room.
    pub async fn toggle_ready(
        &self,
        participant_id: ParticipantId,
    ) -> Result<(), LobbyError> {
        self.handle_for(participant_id)?
            .toggle_ready(participant_id)
            .await
    }

    /// Forwards a host start request to the participant's room.
    pub async fn force_start(
        &self,
        participant_id: ParticipantId,
    ) -> Result<(), LobbyError> {
        self.handle_for(participant_id)?
            .force_start(participant_id)
            .await
    }

    /// Signals the end of the active round in the given room.
    pub async fn end_round(&self, room_id: RoomId) -> Result<(), LobbyError> {
        self.rooms
            .get(&room_id)
            .ok_or(LobbyError::NotFound(room_id))?
            .end_round()
            .await
    }

    /// Returns a point-in-time view of the given room.
    pub async fn snapshot(
        &self,
        room_id: RoomId,
    ) -> Result<RoomSnapshot, LobbyError> {
        self.rooms
            .get(&room_id)
            .ok_or(LobbyError::NotFound(room_id))?
            .snapshot()
            .await
    }

    /// The room a participant is currently placed in, if any.
    pub fn participant_room(
        &self,
        participant_id: ParticipantId,
    ) -> Option<RoomId> {
        self.participant_rooms.get(&participant_id).copied()
    }

    /// Number of open rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Ids of all open rooms, oldest first.
    pub fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.keys().copied().collect();
        ids.sort();
        ids
    }

    fn open_room(&mut self) -> RoomId {
        let room_id = RoomId(self.next_room_id);
        self.next_room_id += 1;
        let handle = room::spawn_room(
            room_id,
            self.config.clone(),
            ROOM_CHANNEL_SIZE,
        );
        self.rooms.insert(room_id, handle);
        tracing::debug!(%room_id, "opened new room");
        room_id
    }

    fn handle_for(
        &self,
        participant_id: ParticipantId,
    ) -> Result<&RoomHandle, LobbyError> {
        let room_id = self
            .participant_rooms
            .get(&participant_id)
            .ok_or(LobbyError::NotInRoom(participant_id))?;
        self.rooms
            .get(room_id)
            .ok_or(LobbyError::NotFound(*room_id))
    }
}
