use std::io;

/// Failures at the socket level. None of these reach trivia clients; the
/// handler logs them and drops the connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The TCP connection arrived but never became a WebSocket.
    #[cfg(feature = "websocket")]
    #[error("websocket upgrade from {peer} failed: {source}")]
    Upgrade {
        peer: std::net::SocketAddr,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[cfg(feature = "websocket")]
    #[error("send failed: {0}")]
    Send(#[source] tokio_tungstenite::tungstenite::Error),

    #[cfg(feature = "websocket")]
    #[error("receive failed: {0}")]
    Receive(#[source] tokio_tungstenite::tungstenite::Error),

    /// The connection was already shut when the operation ran.
    #[error("connection {0} closed")]
    Closed(crate::ConnectionId),
}
