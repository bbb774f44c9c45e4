//! # Greenroom
//!
//! Real-time multiplayer lobby coordination framework.
//!
//! Greenroom runs the waiting room so game servers don't have to:
//! participants connect over WebSocket, get an identity and a color,
//! land in a room with space, ready up, and the room counts down and
//! flips into a round once everyone at quorum agrees. Every state
//! change is broadcast to all members as a sequenced envelope.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use greenroom::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GreenroomError> {
//!     let server = GreenroomServer::<OpenAdmission>::builder()
//!         .bind("0.0.0.0:8080")
//!         .build(OpenAdmission)
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::GreenroomError;
pub use server::{GreenroomServer, GreenroomServerBuilder};

/// The most commonly used types, re-exported in one place.
pub mod prelude {
    pub use greenroom_lobby::{LobbyError, RoomConfig, RoomManager};
    pub use greenroom_protocol::{
        ClientMessage, Codec, Envelope, JsonCodec, MemberEntry,
        ParticipantId, RoomId, RoomStatus, ServerMessage,
    };
    pub use greenroom_registry::{
        AdmissionPolicy, ConnectionRegistry, OpenAdmission, RegistryError,
    };
    pub use greenroom_transport::{
        Connection, ConnectionId, Transport, TransportError,
        WebSocketTransport,
    };

    pub use crate::{GreenroomError, GreenroomServer, GreenroomServerBuilder};
}
