//! `GreenroomServer` builder and server loop.
//!
//! This is the entry point for running a Greenroom coordinator. It ties
//! together all the layers: transport → protocol → registry → lobby.

use std::sync::Arc;

use greenroom_lobby::{RoomConfig, RoomManager};
use greenroom_protocol::JsonCodec;
use greenroom_registry::{AdmissionPolicy, ConnectionRegistry};
use greenroom_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::GreenroomError;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
/// Interior mutability via `Mutex` where needed. The mutexes protect
/// only the indexes — the rooms themselves are actors, so holding
/// these locks is always brief.
pub(crate) struct ServerState<A: AdmissionPolicy> {
    pub(crate) registry: Mutex<ConnectionRegistry>,
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) admission: A,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Greenroom server.
///
/// # Example
///
/// ```rust,ignore
/// use greenroom::prelude::*;
///
/// let server = GreenroomServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(OpenAdmission)
///     .await?;
/// server.run().await
/// ```
pub struct GreenroomServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl GreenroomServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration applied to every room the server opens.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Builds and starts the server with the given admission policy.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults.
    pub async fn build<A: AdmissionPolicy>(
        self,
        admission: A,
    ) -> Result<GreenroomServer<A>, GreenroomError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(ConnectionRegistry::new()),
            rooms: Mutex::new(RoomManager::new(self.room_config)),
            admission,
            codec: JsonCodec,
        });

        Ok(GreenroomServer { transport, state })
    }
}

impl Default for GreenroomServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Greenroom server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GreenroomServer<A: AdmissionPolicy> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A>>,
}

impl<A: AdmissionPolicy> GreenroomServer<A> {
    /// Creates a new builder.
    pub fn builder() -> GreenroomServerBuilder {
        GreenroomServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each
    /// one. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), GreenroomError> {
        tracing::info!(addr = %self.transport.local_addr(), "greenroom server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
