//! Unified error type for the Greenroom framework.

use greenroom_lobby::LobbyError;
use greenroom_protocol::ProtocolError;
use greenroom_registry::RegistryError;
use greenroom_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `greenroom` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GreenroomError {
    /// A transport-level error (bind, handshake, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry-level error (admission denied).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A lobby-level error (room full, not found, not joinable).
    #[error(transparent)]
    Lobby(#[from] LobbyError),
}
