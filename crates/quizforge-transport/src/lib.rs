//! Network edge of Quizforge.
//!
//! Rooms never see sockets. They see a [`ConnectionId`] and an outbound
//! channel; the server's handler sits between that channel and a
//! [`Connection`] produced by some [`Transport`]. WebSocket is the only
//! transport shipped (feature `websocket`, on by default).

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Identifies one live connection, and therefore one player.
///
/// A player *is* the connection that joined: the same person reconnecting
/// over a new socket gets a new id and starts from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Produces connections, one per client.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One client link carrying whole frames in both directions.
///
/// Implementations take `&self` everywhere and must let `send` proceed
/// while another task is parked in `recv`.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send(&self, frame: &[u8]) -> Result<(), Self::Error>;

    /// The next inbound frame, or `Ok(None)` once the peer has closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_round_trips_raw_value() {
        assert_eq!(ConnectionId::new(42).get(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }

    #[test]
    fn test_connection_ids_sort_numerically() {
        let mut ids = vec![
            ConnectionId::new(10),
            ConnectionId::new(3),
            ConnectionId::new(1),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                ConnectionId::new(1),
                ConnectionId::new(3),
                ConnectionId::new(10),
            ]
        );
    }
}
