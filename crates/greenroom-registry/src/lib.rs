//! Connection registry for Greenroom.
//!
//! This crate owns the mapping between transport-level connections and
//! participant identities:
//!
//! 1. **Registration** — a connection arrives, gets a fresh
//!    [`ParticipantId`](greenroom_protocol::ParticipantId) and a display
//!    color ([`ConnectionRegistry`])
//! 2. **Teardown** — idempotent unregistration from either side of the
//!    mapping (participant or connection)
//! 3. **Admission** — the [`AdmissionPolicy`] hook that decides whether
//!    a connection is allowed in before any state is touched
//!
//! # How it fits in the stack
//!
//! ```text
//! Lobby Layer (above)  ← uses participant identities for room membership
//!     ↕
//! Registry Layer (this crate)  ← maps connections to participants
//!     ↕
//! Transport Layer (below)  ← provides ConnectionId
//! ```

#![allow(async_fn_in_trait)]

mod admission;
mod error;
mod registry;

pub use admission::{AdmissionPolicy, OpenAdmission};
pub use error::RegistryError;
pub use registry::{ConnectionRegistry, Registration};
