//! Per-connection handler: admission, registration, and the pump loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Ask the admission policy whether the connection may enter
//!   2. Register → get a ParticipantId and display color
//!   3. Place the participant into a room (existing lobby or fresh)
//!   4. Loop: pump inbound client messages to the room, and the room's
//!      stamped broadcasts out to the socket

use std::sync::Arc;

use greenroom_lobby::ParticipantSender;
use greenroom_protocol::{ClientMessage, Codec, ParticipantId};
use greenroom_registry::AdmissionPolicy;
use greenroom_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::GreenroomError;

/// Drop guard that tears down a participant when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async locks.
/// Both teardown steps are idempotent, so racing a concurrent removal
/// is harmless.
struct ParticipantGuard<A: AdmissionPolicy> {
    participant_id: ParticipantId,
    state: Arc<ServerState<A>>,
}

impl<A: AdmissionPolicy> Drop for ParticipantGuard<A> {
    fn drop(&mut self) {
        let participant_id = self.participant_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.rooms.lock().await.remove(participant_id).await;
            state.registry.lock().await.unregister(participant_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A: AdmissionPolicy>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A>>,
) -> Result<(), GreenroomError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Admission ---
    let connected = state.registry.lock().await.len();
    if let Err(e) = state.admission.admit(conn.peer_addr(), connected).await {
        tracing::info!(%conn_id, error = %e, "connection refused");
        let _ = conn.close().await;
        return Ok(());
    }

    // --- Step 2: Registration ---
    let registration = state.registry.lock().await.register(conn_id);
    let participant_id = registration.participant_id;
    let _guard = ParticipantGuard {
        participant_id,
        state: Arc::clone(&state),
    };

    tracing::info!(%conn_id, %participant_id, "participant admitted");

    // --- Step 3: Room placement ---
    // The room actor owns the sending half for the rest of this
    // participant's life; everything it broadcasts lands in `outbound`.
    let (tx, mut outbound): (ParticipantSender, _) =
        mpsc::unbounded_channel();
    state
        .rooms
        .lock()
        .await
        .assign(participant_id, registration.color, tx)
        .await?;

    // --- Step 4: Pump loop ---
    loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => {
                    handle_client_message(&state, participant_id, &data)
                        .await;
                }
                Ok(None) => {
                    tracing::info!(%participant_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%participant_id, error = %e, "recv error");
                    break;
                }
            },
            envelope = outbound.recv() => match envelope {
                Some(envelope) => {
                    let bytes = state.codec.encode(&envelope)?;
                    if let Err(e) = conn.send(&bytes).await {
                        tracing::debug!(
                            %participant_id, error = %e, "send failed"
                        );
                        break;
                    }
                }
                // The room actor dropped our sender (room shut down).
                None => break,
            },
        }
    }

    let _ = conn.close().await;
    // _guard drops here → room leave and registry teardown fire.
    Ok(())
}

/// Decodes and routes one inbound frame.
///
/// Malformed frames are logged and dropped — a buggy client must not be
/// able to take down its own connection, let alone the room.
async fn handle_client_message<A: AdmissionPolicy>(
    state: &Arc<ServerState<A>>,
    participant_id: ParticipantId,
    data: &[u8],
) {
    let message: ClientMessage = match state.codec.decode(data) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(
                %participant_id, error = %e, "ignoring malformed frame"
            );
            return;
        }
    };

    let result = match message {
        ClientMessage::Ready => {
            state.rooms.lock().await.toggle_ready(participant_id).await
        }
        ClientMessage::StartGame => {
            state.rooms.lock().await.force_start(participant_id).await
        }
    };

    // Routing failures here mean the participant raced their own
    // disconnect; nothing to do but note it.
    if let Err(e) = result {
        tracing::debug!(%participant_id, error = %e, "message routing failed");
    }
}
