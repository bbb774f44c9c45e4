use thiserror::Error;

/// Errors produced by the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to bind the listener to the requested address.
    #[error("failed to bind to address: {0}")]
    BindFailed(String),

    /// The protocol handshake with the peer failed.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// Sending a message to the peer failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receiving a message from the peer failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// The connection is closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
