//! Per-connection handler: decode inbound frames, write outbound events.
//!
//! Each accepted connection gets its own Tokio task running this handler
//! plus a writer task. Rooms never touch the socket; they push
//! [`ServerEvent`]s into the connection's channel and the writer encodes
//! and sends them in order.

use std::sync::Arc;

use quizforge_protocol::{ClientEvent, Codec, ConnectionId, ServerEvent};
use quizforge_room::QuestionProvider;
use quizforge_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::QuizforgeError;
use crate::router::{disconnect, route_event};
use crate::server::ServerState;

/// Drop guard that removes the connection from every room when the
/// handler exits, however it exits.
///
/// `Drop` is synchronous, so the async cleanup runs in its own task.
struct DisconnectGuard<P: QuestionProvider, C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<P, C>>,
}

impl<P: QuestionProvider, C: Codec> Drop for DisconnectGuard<P, C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            disconnect(&state.rooms, conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<P, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<P, C>>,
) -> Result<(), QuizforgeError>
where
    P: QuestionProvider,
    C: Codec,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (sender, outbound) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(
        Arc::clone(&conn),
        Arc::clone(&state),
        outbound,
    ));

    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    let idle = state.config.idle_timeout;
    loop {
        // Any frame resets the deadline, pings included, so it is
        // re-read from the connection every time it passes.
        let deadline = conn.last_seen() + idle;
        let data = match tokio::time::timeout_at(deadline, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) if conn.last_seen() + idle > tokio::time::Instant::now() => {
                continue;
            }
            Err(_) => {
                tracing::info!(%conn_id, "connection idle, closing");
                let _ = conn.close().await;
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode event");
                continue;
            }
        };

        route_event(&state.rooms, conn_id, &sender, event).await;
    }

    writer.abort();
    // _guard drops here → the connection leaves every room.
    Ok(())
}

/// Encodes and sends every event queued for this connection.
async fn write_events<P, C>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<P, C>>,
    mut outbound: mpsc::UnboundedReceiver<ServerEvent>,
) where
    P: QuestionProvider,
    C: Codec,
{
    let conn_id = conn.id();
    while let Some(event) = outbound.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}
