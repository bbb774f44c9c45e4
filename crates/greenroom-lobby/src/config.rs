//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a room instance.
///
/// One config is shared by every room a [`RoomManager`](crate::RoomManager)
/// opens; construct the manager with a different config to change it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Minimum participants required before any start, automatic or
    /// manual.
    pub quorum: usize,

    /// Maximum participants allowed in one room. A room at capacity is
    /// skipped by placement and new joins open a fresh room.
    pub max_participants: usize,

    /// The grace window between "everyone is ready" and the automatic
    /// start, giving a last moment to back out. Restarted whenever the
    /// all-ready condition is freshly re-established.
    pub grace: Duration,

    /// Optional round time limit. `None` means rounds end only on the
    /// external round-end signal.
    pub round_limit: Option<Duration>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            quorum: 2,
            max_participants: 8,
            grace: Duration::from_secs(3),
            round_limit: None,
        }
    }
}
