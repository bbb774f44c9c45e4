//! The connection registry: maps connections to participant identities.
//!
//! This is the only structure shared across rooms. It's responsible for:
//! - Allocating fresh participant identities (monotonic, never reused)
//! - Assigning each participant a display color
//! - Tracking which connection a participant is attached to, both ways
//! - Idempotent teardown when connections drop
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is NOT thread-safe by itself — it uses plain
//! `HashMap`s, not concurrent ones. This is intentional: the registry is
//! owned by the server and accessed through a mutex at a higher level.
//! Keeping it simple here avoids hidden locking overhead.

use std::collections::HashMap;

use greenroom_protocol::ParticipantId;
use greenroom_transport::ConnectionId;
use rand::Rng;

/// Display colors handed out at registration (hex strings clients can
/// use directly). Picked at random; collisions across participants are
/// acceptable — the color is cosmetic, the id is the identity.
const PALETTE: &[&str] = &[
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4",
    "#46f0f0", "#f032e6", "#bcf60c", "#fabebe", "#008080", "#e6beff",
];

/// What a participant gets back from registration.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The freshly allocated identity.
    pub participant_id: ParticipantId,
    /// The assigned display color.
    pub color: String,
}

/// Maps transport connections to participant identities.
///
/// Identities are allocated from a per-registry counter that only ever
/// moves forward, so an id is never reused while a stale reference to a
/// previous holder might still be in flight.
pub struct ConnectionRegistry {
    /// Next identity to hand out. Starts at 1 so 0 never appears on
    /// the wire (easier to spot uninitialized ids in client logs).
    next_participant_id: u64,

    /// participant → connection. The authoritative mapping.
    participants: HashMap<ParticipantId, ConnectionId>,

    /// connection → participant. Kept in sync with `participants` so
    /// the connection teardown path doesn't scan.
    connections: HashMap<ConnectionId, ParticipantId>,
}

impl ConnectionRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            next_participant_id: 1,
            participants: HashMap::new(),
            connections: HashMap::new(),
        }
    }

    /// Registers a connection: allocates a fresh identity and a color.
    ///
    /// Always succeeds. If the connection was somehow already registered
    /// (a transport bug), the stale mapping is replaced and the old
    /// identity is retired.
    pub fn register(&mut self, connection_id: ConnectionId) -> Registration {
        if let Some(stale) = self.connections.remove(&connection_id) {
            tracing::warn!(
                %connection_id,
                participant_id = %stale,
                "connection re-registered, retiring stale identity"
            );
            self.participants.remove(&stale);
        }

        let participant_id = ParticipantId(self.next_participant_id);
        self.next_participant_id += 1;

        let color = pick_color();

        self.participants.insert(participant_id, connection_id);
        self.connections.insert(connection_id, participant_id);

        tracing::info!(%participant_id, %connection_id, %color, "participant registered");

        Registration {
            participant_id,
            color,
        }
    }

    /// Removes a participant's mapping. Idempotent — unregistering an
    /// unknown id is a no-op returning `None`.
    pub fn unregister(
        &mut self,
        participant_id: ParticipantId,
    ) -> Option<ConnectionId> {
        let connection_id = self.participants.remove(&participant_id)?;
        self.connections.remove(&connection_id);
        tracing::info!(%participant_id, %connection_id, "participant unregistered");
        Some(connection_id)
    }

    /// Removes a mapping by connection. The teardown path used by the
    /// connection handler; same idempotence as [`unregister`](Self::unregister).
    pub fn unregister_connection(
        &mut self,
        connection_id: ConnectionId,
    ) -> Option<ParticipantId> {
        let participant_id = self.connections.remove(&connection_id)?;
        self.participants.remove(&participant_id);
        tracing::info!(%participant_id, %connection_id, "connection unregistered");
        Some(participant_id)
    }

    /// Looks up the participant attached to a connection.
    pub fn participant_for(
        &self,
        connection_id: ConnectionId,
    ) -> Option<ParticipantId> {
        self.connections.get(&connection_id).copied()
    }

    /// Looks up the connection a participant is attached to.
    pub fn connection_for(
        &self,
        participant_id: ParticipantId,
    ) -> Option<ConnectionId> {
        self.participants.get(&participant_id).copied()
    }

    /// Returns the number of registered participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Returns `true` if no participants are registered.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn pick_color() -> String {
    let idx = rand::rng().random_range(0..PALETTE.len());
    PALETTE[idx].to_string()
}

// =========================================================================
// Tests
// =========================================================================
