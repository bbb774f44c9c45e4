use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::{Connection, ConnectionId, Transport, TransportError};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// WebSocket transport backed by a TCP listener.
pub struct WebSocketTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl WebSocketTransport {
    /// Binds the listener to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;
        debug!(%local_addr, "websocket transport bound");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the bound address. With port 0 this reveals the port
    /// the OS actually assigned.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(|e| TransportError::HandshakeFailed(e.to_string()))?;
        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| TransportError::HandshakeFailed(e.to_string()))?;
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        debug!(connection_id = %id, %peer, "accepted websocket connection");
        Ok(WebSocketConnection {
            id,
            peer,
            ws: Arc::new(Mutex::new(ws)),
        })
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        debug!(local_addr = %self.local_addr, "websocket transport shut down");
        Ok(())
    }
}

/// An accepted WebSocket connection.
///
/// Cloning is cheap; clones share the underlying stream. Text and binary
/// frames are both surfaced as raw bytes so the codec above decides the
/// wire format.
#[derive(Clone)]
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    ws: Arc<Mutex<WebSocketStream<TcpStream>>>,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let mut ws = self.ws.lock().await;
        ws.send(Message::Binary(data.to_vec().into()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut ws = self.ws.lock().await;
        loop {
            match ws.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.to_vec())),
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Close(_))) => return Ok(None),
                // Pings are answered by tungstenite internally.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::ReceiveFailed(e.to_string())),
                None => return Ok(None),
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        let mut ws = self.ws.lock().await;
        ws.close(None)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(self.peer)
    }
}
