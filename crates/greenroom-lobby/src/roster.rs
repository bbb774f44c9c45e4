//! Insertion-ordered room membership with derived host.
//!
//! The roster is the data structure behind host succession: members are
//! kept in join order, and the host is simply the earliest joiner still
//! present. The host flag is never stored — it cannot go stale, and
//! there is no observable window with zero or two hosts in a non-empty
//! roster, because reassignment IS removal.

use std::collections::{HashMap, VecDeque};

use greenroom_protocol::{MemberEntry, ParticipantId};

/// One member's mutable state. The identity lives in the map key.
#[derive(Debug, Clone)]
pub struct Member {
    /// Display color assigned at registration.
    pub color: String,
    /// Whether this member has declared readiness.
    pub ready: bool,
}

/// Ordered membership of a single room.
///
/// Join order is tracked in a deque alongside the member map. Removal
/// only compacts the front of the deque (stale mid-deque entries are
/// skipped during iteration and cleaned up if they ever reach the
/// front), which keeps host succession O(1) amortized instead of
/// re-deriving order from a snapshot on every change.
///
/// Invariant: the front of the deque is always a live member, or the
/// deque is empty. [`host`](Self::host) relies on this.
#[derive(Debug, Default)]
pub struct Roster {
    order: VecDeque<ParticipantId>,
    members: HashMap<ParticipantId, Member>,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member at the back of the join order, not ready.
    ///
    /// Returns `false` (without modifying anything) if the participant
    /// is already a member.
    pub fn insert(&mut self, id: ParticipantId, color: String) -> bool {
        if self.members.contains_key(&id) {
            return false;
        }
        self.order.push_back(id);
        self.members.insert(
            id,
            Member {
                color,
                ready: false,
            },
        );
        true
    }

    /// Removes a member. Returns `false` if they weren't present.
    ///
    /// Host succession happens here, synchronously: if the removed
    /// member was the host, the next live entry becomes the front of
    /// the deque before this method returns.
    pub fn remove(&mut self, id: ParticipantId) -> bool {
        if self.members.remove(&id).is_none() {
            return false;
        }
        // Compact stale entries off the front so host() stays O(1).
        while let Some(front) = self.order.front() {
            if self.members.contains_key(front) {
                break;
            }
            self.order.pop_front();
        }
        true
    }

    /// The current host: the earliest joiner still present.
    pub fn host(&self) -> Option<ParticipantId> {
        self.order.front().copied()
    }

    /// Whether the given participant is a member.
    pub fn contains(&self, id: ParticipantId) -> bool {
        self.members.contains_key(&id)
    }

    /// Flips a member's readiness flag.
    ///
    /// Returns `None` for a non-member, otherwise the new value.
    pub fn toggle_ready(&mut self, id: ParticipantId) -> Option<bool> {
        let member = self.members.get_mut(&id)?;
        member.ready = !member.ready;
        Some(member.ready)
    }

    /// Whether every member is ready. An empty roster is not "all
    /// ready" — there is nobody to be ready.
    pub fn all_ready(&self) -> bool {
        !self.members.is_empty()
            && self.members.values().all(|m| m.ready)
    }

    /// Clears every readiness flag.
    pub fn reset_ready(&mut self) {
        for member in self.members.values_mut() {
            member.ready = false;
        }
    }

    /// Live member ids in join order.
    pub fn ids(&self) -> Vec<ParticipantId> {
        self.order
            .iter()
            .filter(|id| self.members.contains_key(id))
            .copied()
            .collect()
    }

    /// The roster as wire entries, in join order, host flag derived.
    pub fn entries(&self) -> Vec<MemberEntry> {
        let host = self.host();
        self.order
            .iter()
            .filter_map(|id| {
                let member = self.members.get(id)?;
                Some(MemberEntry {
                    id: *id,
                    color: member.color.clone(),
                    ready: member.ready,
                    host: Some(*id) == host,
                })
            })
            .collect()
    }

    /// Number of live members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the roster has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
