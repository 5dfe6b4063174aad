//! [`Transport`] over WebSocket, built on `tokio-tungstenite`.

use std::net::SocketAddr;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::{Connection, ConnectionId, Transport, TransportError};

type WsStream = WebSocketStream<TcpStream>;

/// Listens for TCP connections and upgrades each one to a WebSocket.
///
/// Connection ids are handed out in accept order, starting at 1.
pub struct WebSocketTransport {
    listener: TcpListener,
    next_id: u64,
}

impl WebSocketTransport {
    /// Binds to `addr`. Use port 0 to let the OS pick one, then read it
    /// back with [`local_addr`](Self::local_addr).
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener =
            TcpListener::bind(addr)
                .await
                .map_err(|source| TransportError::Bind {
                    addr: addr.to_string(),
                    source,
                })?;
        tracing::info!(addr, "listening for websocket clients");
        Ok(Self {
            listener,
            next_id: 1,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<WebSocketConnection, TransportError> {
        let (tcp, peer) =
            self.listener.accept().await.map_err(TransportError::Accept)?;

        let ws = tokio_tungstenite::accept_async(tcp)
            .await
            .map_err(|source| TransportError::Upgrade { peer, source })?;

        let id = ConnectionId::new(self.next_id);
        self.next_id += 1;
        tracing::debug!(%id, %peer, "websocket client connected");

        Ok(WebSocketConnection::new(id, peer, ws))
    }
}

/// A connected WebSocket client.
///
/// Reading and writing lock different halves of the stream, so a handler
/// blocked in [`recv`](Connection::recv) never delays outbound events.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    writer: Mutex<SplitSink<WsStream, Message>>,
    reader: Mutex<SplitStream<WsStream>>,
    /// When the peer last sent any frame, control frames included.
    last_seen: watch::Sender<Instant>,
}

impl WebSocketConnection {
    fn new(id: ConnectionId, peer: SocketAddr, ws: WsStream) -> Self {
        let (writer, reader) = ws.split();
        Self {
            id,
            peer,
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
            last_seen: watch::Sender::new(Instant::now()),
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// When the peer last showed signs of life.
    ///
    /// Pings and pongs count even though [`recv`](Connection::recv) never
    /// returns them, so a client with nothing to say can still keep its
    /// connection open.
    pub fn last_seen(&self) -> Instant {
        *self.last_seen.borrow()
    }

    fn map_closed(&self, err: tungstenite::Error) -> TransportError {
        match err {
            tungstenite::Error::ConnectionClosed
            | tungstenite::Error::AlreadyClosed => TransportError::Closed(self.id),
            other => TransportError::Send(other),
        }
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    /// Text frame when `frame` is UTF-8 (every JSON event is), binary
    /// otherwise.
    async fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        let msg = match std::str::from_utf8(frame) {
            Ok(text) => Message::text(text),
            Err(_) => Message::binary(frame.to_vec()),
        };
        let mut writer = self.writer.lock().await;
        writer.send(msg).await.map_err(|e| self.map_closed(e))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut reader = self.reader.lock().await;
        while let Some(msg) = reader.next().await {
            let msg = msg.map_err(TransportError::Receive)?;
            self.last_seen.send_replace(Instant::now());
            match msg {
                Message::Text(text) => return Ok(Some(text.as_bytes().to_vec())),
                Message::Binary(data) => return Ok(Some(data.to_vec())),
                Message::Close(frame) => {
                    tracing::trace!(id = %self.id, ?frame, "close frame");
                    return Ok(None);
                }
                // tungstenite answers pings on its own
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer.close().await.map_err(|e| self.map_closed(e))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
