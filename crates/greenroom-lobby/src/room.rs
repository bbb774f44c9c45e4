//! Room actor: an isolated Tokio task that owns one lobby/play cycle.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. This is the "actor model" — no shared
//! mutable state, just message passing, which is what makes "one
//! logical writer per room" true by construction.
//!
//! The actor is also the broadcast dispatcher: every state change is
//! stamped with the room's sequence number and fanned out to each
//! member's outbound channel in join order.

use std::collections::HashMap;
use std::time::Instant;

use greenroom_countdown::Countdown;
use greenroom_protocol::{
    Envelope, ParticipantId, RoomId, RoomStatus, ServerMessage,
};
use tokio::sync::{mpsc, oneshot};

use crate::{LobbyError, RoomConfig};
use crate::roster::Roster;

/// Channel sender for delivering stamped envelopes to one participant's
/// connection handler.
pub type ParticipantSender = mpsc::UnboundedSender<Envelope<ServerMessage>>;

/// Commands sent to a room actor through its channel.
///
/// Variants with a `oneshot::Sender` are request/response; the rest are
/// fire-and-forget (their outcomes surface as broadcasts or per-member
/// denials, never as errors to the caller).
pub(crate) enum RoomCommand {
    /// Add a participant to the roster.
    Join {
        participant_id: ParticipantId,
        color: String,
        sender: ParticipantSender,
        reply: oneshot::Sender<Result<(), LobbyError>>,
    },

    /// Remove a participant. Replies with the remaining member count so
    /// the manager can prune an emptied room. Idempotent.
    Leave {
        participant_id: ParticipantId,
        reply: oneshot::Sender<usize>,
    },

    /// Flip a participant's readiness flag.
    ToggleReady { participant_id: ParticipantId },

    /// Host-only request to start immediately, skipping the grace
    /// period (but not the quorum).
    ForceStart { participant_id: ParticipantId },

    /// External signal that the active round is over.
    EndRound,

    /// Request the current room state.
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },

    /// Shut down the room.
    Shutdown,
}

/// A point-in-time view of a room, for placement decisions and tests.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    /// The room's unique ID.
    pub room_id: RoomId,
    /// Current phase.
    pub status: RoomStatus,
    /// Members in join order, host flag derived.
    pub members: Vec<greenroom_protocol::MemberEntry>,
    /// Maximum participants allowed.
    pub max_participants: usize,
}

impl RoomSnapshot {
    /// Whether placement may put a new participant here.
    pub fn is_joinable(&self) -> bool {
        self.status == RoomStatus::Lobby
            && self.members.len() < self.max_participants
    }
}

/// Handle to a running room actor. Cheap to clone — it's just an
/// `mpsc::Sender` wrapper. The [`RoomManager`](crate::RoomManager)
/// holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Adds a participant to the room.
    pub async fn join(
        &self,
        participant_id: ParticipantId,
        color: String,
        sender: ParticipantSender,
    ) -> Result<(), LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                participant_id,
                color,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| LobbyError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| LobbyError::Unavailable(self.room_id))?
    }

    /// Removes a participant. Returns the remaining member count.
    /// Removing a non-member is a no-op, not an error.
    pub async fn leave(
        &self,
        participant_id: ParticipantId,
    ) -> Result<usize, LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                participant_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| LobbyError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| LobbyError::Unavailable(self.room_id))
    }

    /// Flips a participant's readiness flag (fire-and-forget).
    pub async fn toggle_ready(
        &self,
        participant_id: ParticipantId,
    ) -> Result<(), LobbyError> {
        self.sender
            .send(RoomCommand::ToggleReady { participant_id })
            .await
            .map_err(|_| LobbyError::Unavailable(self.room_id))
    }

    /// Requests an immediate start on behalf of a participant
    /// (fire-and-forget; rejections go back as `denied` messages).
    pub async fn force_start(
        &self,
        participant_id: ParticipantId,
    ) -> Result<(), LobbyError> {
        self.sender
            .send(RoomCommand::ForceStart { participant_id })
            .await
            .map_err(|_| LobbyError::Unavailable(self.room_id))
    }

    /// Signals that the active round has ended.
    pub async fn end_round(&self) -> Result<(), LobbyError> {
        self.sender
            .send(RoomCommand::EndRound)
            .await
            .map_err(|_| LobbyError::Unavailable(self.room_id))
    }

    /// Requests the current room state.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, LobbyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| LobbyError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| LobbyError::Unavailable(self.room_id))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), LobbyError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| LobbyError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    status: RoomStatus,
    config: RoomConfig,
    roster: Roster,
    /// Per-participant outbound channels.
    senders: HashMap<ParticipantId, ParticipantSender>,
    /// Auto-start grace countdown. Armed only while everyone is ready.
    grace: Countdown,
    /// Optional round time limit. Armed while a round is in progress.
    round: Countdown,
    /// Per-room broadcast sequence number.
    seq: u64,
    /// Envelope timestamps are milliseconds since room creation.
    created_at: Instant,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until the room empties or is shut down.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room opened");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(RoomCommand::Join {
                        participant_id,
                        color,
                        sender,
                        reply,
                    }) => {
                        let result =
                            self.handle_join(participant_id, color, sender);
                        let _ = reply.send(result);
                    }
                    Some(RoomCommand::Leave {
                        participant_id,
                        reply,
                    }) => {
                        let removed = self.handle_leave(participant_id);
                        let _ = reply.send(self.roster.len());
                        if removed && self.roster.is_empty() {
                            // Rooms are destroyed when empty.
                            break;
                        }
                    }
                    Some(RoomCommand::ToggleReady { participant_id }) => {
                        self.handle_toggle_ready(participant_id);
                    }
                    Some(RoomCommand::ForceStart { participant_id }) => {
                        self.handle_force_start(participant_id);
                    }
                    Some(RoomCommand::EndRound) => {
                        self.end_round("external round-end signal");
                    }
                    Some(RoomCommand::Snapshot { reply }) => {
                        let _ = reply.send(self.snapshot());
                    }
                    Some(RoomCommand::Shutdown) | None => break,
                },
                _ = self.grace.expired() => {
                    self.handle_grace_elapsed();
                }
                _ = self.round.expired() => {
                    self.end_round("round time limit reached");
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room closed");
    }

    fn handle_join(
        &mut self,
        participant_id: ParticipantId,
        color: String,
        sender: ParticipantSender,
    ) -> Result<(), LobbyError> {
        if self.status != RoomStatus::Lobby {
            return Err(LobbyError::NotJoinable(self.room_id));
        }
        if self.roster.contains(participant_id) {
            return Err(LobbyError::AlreadyJoined(
                participant_id,
                self.room_id,
            ));
        }
        if self.roster.len() >= self.config.max_participants {
            return Err(LobbyError::Full(self.room_id));
        }

        self.roster.insert(participant_id, color.clone());
        self.senders.insert(participant_id, sender);

        // Membership changed: any pending auto-start is void. The
        // newcomer joins not-ready, so the condition can't hold now.
        self.grace.cancel();

        tracing::info!(
            room_id = %self.room_id,
            %participant_id,
            members = self.roster.len(),
            "participant joined"
        );

        // Tell the newcomer who they are, then show everyone the roster.
        let host = self.roster.host() == Some(participant_id);
        let init = self.stamp(ServerMessage::Init {
            participant_id,
            color,
            host,
        });
        self.send_to(participant_id, init);
        self.broadcast_lobby_state();

        Ok(())
    }

    /// Returns whether a member was actually removed.
    fn handle_leave(&mut self, participant_id: ParticipantId) -> bool {
        if !self.roster.remove(participant_id) {
            tracing::debug!(
                room_id = %self.room_id,
                %participant_id,
                "leave for non-member ignored"
            );
            return false;
        }
        self.senders.remove(&participant_id);

        // Membership change cancels a pending auto-start; if the
        // remaining members are unanimously ready, the full grace
        // window restarts below.
        self.grace.cancel();

        tracing::info!(
            room_id = %self.room_id,
            %participant_id,
            members = self.roster.len(),
            "participant left"
        );

        if self.roster.is_empty() {
            return true;
        }

        if self.status == RoomStatus::Playing
            && self.roster.len() < self.config.quorum
        {
            self.end_round("participant count dropped below quorum");
        } else {
            if self.status == RoomStatus::Lobby {
                self.evaluate_auto_start();
            }
            self.broadcast_lobby_state();
        }

        true
    }

    fn handle_toggle_ready(&mut self, participant_id: ParticipantId) {
        if self.status == RoomStatus::Playing {
            // Honoring this would leak readiness into the next lobby
            // phase.
            tracing::debug!(
                room_id = %self.room_id,
                %participant_id,
                "ready toggle while playing ignored"
            );
            return;
        }

        match self.roster.toggle_ready(participant_id) {
            None => {
                tracing::warn!(
                    room_id = %self.room_id,
                    %participant_id,
                    "ready toggle from non-member rejected"
                );
            }
            Some(ready) => {
                tracing::debug!(
                    room_id = %self.room_id,
                    %participant_id,
                    ready,
                    "readiness toggled"
                );
                self.evaluate_auto_start();
                self.broadcast_lobby_state();
            }
        }
    }

    fn handle_force_start(&mut self, participant_id: ParticipantId) {
        if !self.roster.contains(participant_id) {
            tracing::warn!(
                room_id = %self.room_id,
                %participant_id,
                "start request from non-member dropped"
            );
            return;
        }
        if self.status == RoomStatus::Playing {
            self.deny(participant_id, 409, "round already in progress");
            return;
        }
        if self.roster.host() != Some(participant_id) {
            self.deny(participant_id, 403, "only the host may start");
            return;
        }
        if self.roster.len() < self.config.quorum {
            self.deny(
                participant_id,
                409,
                &format!(
                    "need at least {} participants to start",
                    self.config.quorum
                ),
            );
            return;
        }

        self.start_round("manual start by host");
    }

    /// The grace countdown fired. The deadline was valid when armed,
    /// but the condition must be re-validated now — arming time is not
    /// firing time.
    fn handle_grace_elapsed(&mut self) {
        if self.status != RoomStatus::Lobby
            || self.roster.len() < self.config.quorum
            || !self.roster.all_ready()
        {
            tracing::debug!(
                room_id = %self.room_id,
                "start countdown fired but condition no longer holds"
            );
            return;
        }
        self.start_round("grace period elapsed");
    }

    /// Arms the grace countdown if the auto-start condition holds,
    /// cancels it otherwise. Arming always restarts the full window:
    /// the condition was freshly (re-)established by whatever change
    /// triggered this evaluation.
    fn evaluate_auto_start(&mut self) {
        if self.roster.len() >= self.config.quorum
            && self.roster.all_ready()
        {
            self.grace.arm();
            tracing::debug!(
                room_id = %self.room_id,
                grace_ms = self.config.grace.as_millis() as u64,
                "all ready, start countdown armed"
            );
        } else {
            self.grace.cancel();
        }
    }

    fn start_round(&mut self, reason: &str) {
        self.grace.cancel();
        self.status = RoomStatus::Playing;
        // Stale readiness must not carry into the next lobby phase.
        self.roster.reset_ready();
        self.round.arm();

        tracing::info!(room_id = %self.room_id, reason, "round started");

        let start = self.stamp(ServerMessage::GameStart);
        self.broadcast(start);
        self.broadcast_lobby_state();
    }

    fn end_round(&mut self, reason: &str) {
        if self.status != RoomStatus::Playing {
            tracing::debug!(
                room_id = %self.room_id,
                "round end outside a round ignored"
            );
            return;
        }
        self.round.cancel();
        self.status = RoomStatus::Lobby;

        tracing::info!(room_id = %self.room_id, reason, "round ended");

        let end = self.stamp(ServerMessage::GameEnd);
        self.broadcast(end);
        self.broadcast_lobby_state();
    }

    /// Sends a full roster snapshot to every member. Called after every
    /// membership or readiness change and on phase transitions.
    fn broadcast_lobby_state(&mut self) {
        let update = self.stamp(ServerMessage::LobbyUpdate {
            status: self.status,
            members: self.roster.entries(),
        });
        self.broadcast(update);
    }

    /// Fans an envelope out to every member in join order. All
    /// recipients see the same sequence number for the same change.
    fn broadcast(&self, envelope: Envelope<ServerMessage>) {
        for participant_id in self.roster.ids() {
            self.send_to(participant_id, envelope.clone());
        }
    }

    /// Sends a rejection to a single participant.
    fn deny(
        &mut self,
        participant_id: ParticipantId,
        code: u16,
        reason: &str,
    ) {
        tracing::debug!(
            room_id = %self.room_id,
            %participant_id,
            code,
            reason,
            "request denied"
        );
        let denial = self.stamp(ServerMessage::Denied {
            code,
            reason: reason.to_string(),
        });
        self.send_to(participant_id, denial);
    }

    /// Sends an envelope to a single participant. Silently drops if the
    /// receiver is gone (participant disconnected mid-broadcast).
    fn send_to(
        &self,
        participant_id: ParticipantId,
        envelope: Envelope<ServerMessage>,
    ) {
        if let Some(sender) = self.senders.get(&participant_id) {
            let _ = sender.send(envelope);
        }
    }

    /// Wraps a message in an envelope with the next sequence number and
    /// a milliseconds-since-creation timestamp.
    fn stamp(&mut self, message: ServerMessage) -> Envelope<ServerMessage> {
        self.seq += 1;
        Envelope {
            seq: self.seq,
            timestamp: self.created_at.elapsed().as_millis() as u64,
            message,
        }
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.room_id,
            status: self.status,
            members: self.roster.entries(),
            max_participants: self.config.max_participants,
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
pub(crate) fn spawn_room(
    room_id: RoomId,
    config: RoomConfig,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let grace = Countdown::new(config.grace);
    let round = Countdown::from_window(config.round_limit);

    let actor = RoomActor {
        room_id,
        status: RoomStatus::Lobby,
        config,
        roster: Roster::new(),
        senders: HashMap::new(),
        grace,
        round,
        seq: 0,
        created_at: Instant::now(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
