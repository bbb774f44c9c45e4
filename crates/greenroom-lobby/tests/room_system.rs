//! End-to-end tests for the room system: placement, the lobby state
//! machine, the auto-start grace countdown, host succession, and
//! broadcast ordering.
//!
//! All tests run on a paused Tokio clock, so grace windows and round
//! limits elapse instantly and deterministically.

use std::time::Duration;

use greenroom_lobby::{LobbyError, RoomConfig, RoomManager};
use greenroom_protocol::{
    Envelope, ParticipantId, RoomStatus, ServerMessage,
};
use tokio::sync::mpsc;

type Inbox = mpsc::UnboundedReceiver<Envelope<ServerMessage>>;

fn pid(id: u64) -> ParticipantId {
    ParticipantId(id)
}

fn test_config() -> RoomConfig {
    RoomConfig {
        quorum: 2,
        max_participants: 4,
        grace: Duration::from_secs(3),
        round_limit: None,
    }
}

/// Places a participant through the manager, returning their inbox.
async fn join(
    manager: &mut RoomManager,
    id: u64,
) -> Inbox {
    let (tx, rx) = mpsc::unbounded_channel();
    manager
        .assign(pid(id), format!("#{id:06x}"), tx)
        .await
        .expect("assign");
    rx
}

/// Drains every envelope currently queued in an inbox.
fn drain(inbox: &mut Inbox) -> Vec<Envelope<ServerMessage>> {
    let mut out = Vec::new();
    while let Ok(envelope) = inbox.try_recv() {
        out.push(envelope);
    }
    out
}

/// Waits until the room actor has processed all commands sent so far.
/// Commands are handled in order, so a snapshot round trip is a fence.
async fn settle(manager: &RoomManager, room: greenroom_protocol::RoomId) {
    manager.snapshot(room).await.expect("snapshot");
}

fn last_lobby_update(
    envelopes: &[Envelope<ServerMessage>],
) -> (RoomStatus, Vec<greenroom_protocol::MemberEntry>) {
    envelopes
        .iter()
        .rev()
        .find_map(|e| match &e.message {
            ServerMessage::LobbyUpdate { status, members } => {
                Some((*status, members.clone()))
            }
            _ => None,
        })
        .expect("no lobbyUpdate received")
}

fn has_game_start(envelopes: &[Envelope<ServerMessage>]) -> bool {
    envelopes
        .iter()
        .any(|e| matches!(e.message, ServerMessage::GameStart))
}

// =========================================================================
// Joining and the init handshake
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_message_is_init_with_host_flag() {
    let mut manager = RoomManager::new(test_config());

    let mut alice = join(&mut manager, 1).await;
    let mut bob = join(&mut manager, 2).await;

    let first = drain(&mut alice).into_iter().next().expect("no message");
    match first.message {
        ServerMessage::Init {
            participant_id,
            host,
            ..
        } => {
            assert_eq!(participant_id, pid(1));
            assert!(host, "first joiner must be host");
        }
        other => panic!("expected init, got {other:?}"),
    }

    let first = drain(&mut bob).into_iter().next().expect("no message");
    match first.message {
        ServerMessage::Init { host, .. } => {
            assert!(!host, "second joiner must not be host");
        }
        other => panic!("expected init, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_every_member_sees_roster_after_join() {
    let mut manager = RoomManager::new(test_config());

    let mut alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");
    settle(&manager, room).await;

    let (status, members) = last_lobby_update(&drain(&mut alice));
    assert_eq!(status, RoomStatus::Lobby);
    let ids: Vec<u64> = members.iter().map(|m| m.id.0).collect();
    assert_eq!(ids, vec![1, 2], "roster in join order");
}

#[tokio::test(start_paused = true)]
async fn test_full_room_overflows_into_new_room() {
    let mut config = test_config();
    config.max_participants = 2;
    let mut manager = RoomManager::new(config);

    let _a = join(&mut manager, 1).await;
    let _b = join(&mut manager, 2).await;
    let _c = join(&mut manager, 3).await;

    assert_eq!(manager.room_count(), 2);
    assert_ne!(
        manager.participant_room(pid(1)),
        manager.participant_room(pid(3)),
    );
}

#[tokio::test(start_paused = true)]
async fn test_double_assign_rejected() {
    let mut manager = RoomManager::new(test_config());
    let _a = join(&mut manager, 1).await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let err = manager
        .assign(pid(1), "#ffffff".into(), tx)
        .await
        .expect_err("second assign must fail");
    assert!(matches!(err, LobbyError::AlreadyJoined(..)));
}

// =========================================================================
// Auto-start: quorum + unanimous readiness + grace window
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_all_ready_starts_after_grace() {
    let mut manager = RoomManager::new(test_config());
    let mut alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.toggle_ready(pid(1)).await.expect("ready");
    manager.toggle_ready(pid(2)).await.expect("ready");
    settle(&manager, room).await;

    // Not yet: the grace window is still open.
    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Lobby);

    tokio::time::sleep(Duration::from_millis(3100)).await;

    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Playing);
    assert!(has_game_start(&drain(&mut alice)));
}

#[tokio::test(start_paused = true)]
async fn test_single_ready_participant_never_starts() {
    let mut manager = RoomManager::new(test_config());
    let _alice = join(&mut manager, 1).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.toggle_ready(pid(1)).await.expect("ready");
    tokio::time::sleep(Duration::from_secs(30)).await;

    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(
        snapshot.status,
        RoomStatus::Lobby,
        "below quorum must never auto-start"
    );
}

#[tokio::test(start_paused = true)]
async fn test_unready_during_grace_cancels_start() {
    let mut manager = RoomManager::new(test_config());
    let _alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.toggle_ready(pid(1)).await.expect("ready");
    manager.toggle_ready(pid(2)).await.expect("ready");
    settle(&manager, room).await;

    tokio::time::sleep(Duration::from_secs(1)).await;
    manager.toggle_ready(pid(2)).await.expect("unready");
    settle(&manager, room).await;

    tokio::time::sleep(Duration::from_secs(30)).await;
    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Lobby);
}

#[tokio::test(start_paused = true)]
async fn test_re_ready_restarts_full_grace_window() {
    let mut manager = RoomManager::new(test_config());
    let _alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.toggle_ready(pid(1)).await.expect("ready");
    manager.toggle_ready(pid(2)).await.expect("ready");
    settle(&manager, room).await;

    // Back out 2s into the window, then re-ready.
    tokio::time::sleep(Duration::from_secs(2)).await;
    manager.toggle_ready(pid(2)).await.expect("unready");
    manager.toggle_ready(pid(2)).await.expect("ready");
    settle(&manager, room).await;

    // 2s later the original deadline has long passed, but the window
    // restarted in full, so the room is still in lobby.
    tokio::time::sleep(Duration::from_secs(2)).await;
    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Lobby);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_join_during_grace_cancels_start() {
    let mut manager = RoomManager::new(test_config());
    let _alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.toggle_ready(pid(1)).await.expect("ready");
    manager.toggle_ready(pid(2)).await.expect("ready");
    settle(&manager, room).await;

    tokio::time::sleep(Duration::from_secs(1)).await;
    // A newcomer joins not-ready, voiding the countdown.
    let _carol = join(&mut manager, 3).await;

    tokio::time::sleep(Duration::from_secs(30)).await;
    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Lobby);
    assert_eq!(snapshot.members.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_second_toggle_withdraws_readiness() {
    let mut manager = RoomManager::new(test_config());
    let _alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.toggle_ready(pid(1)).await.expect("ready");
    settle(&manager, room).await;

    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert!(snapshot.members.iter().any(|m| m.id == pid(1) && m.ready));

    // Toggling again backs out, it never re-declares.
    manager.toggle_ready(pid(1)).await.expect("unready");
    settle(&manager, room).await;

    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert!(snapshot.members.iter().all(|m| !m.ready));
}

// =========================================================================
// Manual start
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_host_start_skips_grace() {
    let mut manager = RoomManager::new(test_config());
    let mut alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    // Nobody is ready, but the host may start at quorum.
    manager.force_start(pid(1)).await.expect("start");
    settle(&manager, room).await;

    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Playing);
    assert!(has_game_start(&drain(&mut alice)));
}

#[tokio::test(start_paused = true)]
async fn test_non_host_start_denied_with_403() {
    let mut manager = RoomManager::new(test_config());
    let mut alice = join(&mut manager, 1).await;
    let mut bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.force_start(pid(2)).await.expect("send");
    settle(&manager, room).await;

    let denials: Vec<u16> = drain(&mut bob)
        .iter()
        .filter_map(|e| match e.message {
            ServerMessage::Denied { code, .. } => Some(code),
            _ => None,
        })
        .collect();
    assert_eq!(denials, vec![403]);

    // The denial is private to the requester.
    assert!(drain(&mut alice)
        .iter()
        .all(|e| !matches!(e.message, ServerMessage::Denied { .. })));

    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Lobby);
}

#[tokio::test(start_paused = true)]
async fn test_host_start_below_quorum_denied_with_409() {
    let mut manager = RoomManager::new(test_config());
    let mut alice = join(&mut manager, 1).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.force_start(pid(1)).await.expect("send");
    settle(&manager, room).await;

    let denied = drain(&mut alice).iter().any(|e| {
        matches!(e.message, ServerMessage::Denied { code: 409, .. })
    });
    assert!(denied);

    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Lobby);
}

#[tokio::test(start_paused = true)]
async fn test_start_while_playing_denied_with_409() {
    let mut manager = RoomManager::new(test_config());
    let mut alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.force_start(pid(1)).await.expect("start");
    settle(&manager, room).await;
    drain(&mut alice);

    manager.force_start(pid(1)).await.expect("send");
    settle(&manager, room).await;

    let denied = drain(&mut alice).iter().any(|e| {
        matches!(e.message, ServerMessage::Denied { code: 409, .. })
    });
    assert!(denied);
}

// =========================================================================
// Host succession
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_host_leave_promotes_next_joiner() {
    let mut manager = RoomManager::new(test_config());
    let _alice = join(&mut manager, 1).await;
    let mut bob = join(&mut manager, 2).await;
    let _carol = join(&mut manager, 3).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.remove(pid(1)).await;
    settle(&manager, room).await;

    let (_, members) = last_lobby_update(&drain(&mut bob));
    let hosts: Vec<u64> = members
        .iter()
        .filter(|m| m.host)
        .map(|m| m.id.0)
        .collect();
    assert_eq!(hosts, vec![2], "second joiner inherits host");
}

#[tokio::test(start_paused = true)]
async fn test_promoted_host_may_start() {
    let mut manager = RoomManager::new(test_config());
    let _alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let _carol = join(&mut manager, 3).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.remove(pid(1)).await;
    manager.force_start(pid(2)).await.expect("start");
    settle(&manager, room).await;

    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Playing);
}

// =========================================================================
// Rounds: ending, quorum drop, readiness reset
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_round_end_returns_to_lobby_with_reset_readiness() {
    let mut manager = RoomManager::new(test_config());
    let mut alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.toggle_ready(pid(1)).await.expect("ready");
    manager.toggle_ready(pid(2)).await.expect("ready");
    tokio::time::sleep(Duration::from_millis(3100)).await;
    drain(&mut alice);

    manager.end_round(room).await.expect("end");
    settle(&manager, room).await;

    let envelopes = drain(&mut alice);
    assert!(envelopes
        .iter()
        .any(|e| matches!(e.message, ServerMessage::GameEnd)));

    let (status, members) = last_lobby_update(&envelopes);
    assert_eq!(status, RoomStatus::Lobby);
    assert!(
        members.iter().all(|m| !m.ready),
        "readiness must not survive a round"
    );
    assert!(
        members[0].id == pid(1) && members[0].host,
        "host unchanged across the round"
    );

    // Back in lobby, no countdown pending.
    tokio::time::sleep(Duration::from_secs(30)).await;
    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Lobby);
}

#[tokio::test(start_paused = true)]
async fn test_quorum_drop_during_round_ends_it() {
    let mut manager = RoomManager::new(test_config());
    let mut alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.force_start(pid(1)).await.expect("start");
    settle(&manager, room).await;
    drain(&mut alice);

    manager.remove(pid(2)).await;
    settle(&manager, room).await;

    let envelopes = drain(&mut alice);
    assert!(envelopes
        .iter()
        .any(|e| matches!(e.message, ServerMessage::GameEnd)));
    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Lobby);
}

#[tokio::test(start_paused = true)]
async fn test_round_limit_ends_round_automatically() {
    let mut config = test_config();
    config.round_limit = Some(Duration::from_secs(20));
    let mut manager = RoomManager::new(config);
    let mut alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.force_start(pid(1)).await.expect("start");
    settle(&manager, room).await;
    drain(&mut alice);

    tokio::time::sleep(Duration::from_millis(20_100)).await;

    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.status, RoomStatus::Lobby);
    assert!(drain(&mut alice)
        .iter()
        .any(|e| matches!(e.message, ServerMessage::GameEnd)));
}

#[tokio::test(start_paused = true)]
async fn test_ready_toggle_while_playing_ignored() {
    let mut manager = RoomManager::new(test_config());
    let _alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.force_start(pid(1)).await.expect("start");
    manager.toggle_ready(pid(1)).await.expect("send");
    manager.end_round(room).await.expect("end");
    settle(&manager, room).await;

    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert!(
        snapshot.members.iter().all(|m| !m.ready),
        "mid-round toggle must not leak into the next lobby"
    );
}

// =========================================================================
// Join while playing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_join_while_playing_opens_fresh_room() {
    let mut manager = RoomManager::new(test_config());
    let _alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.force_start(pid(1)).await.expect("start");
    settle(&manager, room).await;

    let _carol = join(&mut manager, 3).await;

    let carol_room = manager.participant_room(pid(3)).expect("room");
    assert_ne!(room, carol_room, "mid-round room must not admit joins");
    assert_eq!(manager.room_count(), 2);
}

// =========================================================================
// Leaving and pruning
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_remove_is_idempotent() {
    let mut manager = RoomManager::new(test_config());
    let _alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.remove(pid(1)).await;
    manager.remove(pid(1)).await;
    manager.remove(pid(99)).await;

    let snapshot = manager.snapshot(room).await.expect("snapshot");
    assert_eq!(snapshot.members.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_room_pruned_when_last_member_leaves() {
    let mut manager = RoomManager::new(test_config());
    let _alice = join(&mut manager, 1).await;
    assert_eq!(manager.room_count(), 1);

    manager.remove(pid(1)).await;

    assert_eq!(manager.room_count(), 0);
    assert_eq!(manager.participant_room(pid(1)), None);
}

// =========================================================================
// Broadcast ordering
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_sequence_numbers_strictly_increase() {
    let mut manager = RoomManager::new(test_config());
    let mut alice = join(&mut manager, 1).await;
    let _bob = join(&mut manager, 2).await;
    let room = manager.participant_room(pid(1)).expect("room");

    manager.toggle_ready(pid(1)).await.expect("ready");
    manager.toggle_ready(pid(2)).await.expect("ready");
    tokio::time::sleep(Duration::from_millis(3100)).await;
    manager.end_round(room).await.expect("end");
    settle(&manager, room).await;

    let envelopes = drain(&mut alice);
    assert!(envelopes.len() >= 5);
    for pair in envelopes.windows(2) {
        assert!(
            pair[1].seq > pair[0].seq,
            "seq must strictly increase: {} then {}",
            pair[0].seq,
            pair[1].seq
        );
    }
}
