//! Routes decoded client events to rooms.
//!
//! Nothing here touches a socket: the router only sees a connection id,
//! the connection's outbound channel and the shared registry. Rooms are
//! looked up under the registry lock; the lock is released before any
//! room is awaited.

use quizforge_protocol::{ClientEvent, ConnectionId, GameMode, RoomId, ServerEvent};
use quizforge_room::{
    PlayerSender, QuestionProvider, RoomError, RoomHandle, RoomRegistry,
    leave_rooms,
};
use tokio::sync::Mutex;

pub(crate) const ROOM_ID_REQUIRED: &str = "Room ID is required";
pub(crate) const ROOM_NOT_FOUND: &str = "Room not found";

/// Applies one client event.
///
/// Only two failures reach the client, as an `errorMsg`: a join without a
/// room id, and a start for a room that doesn't exist. Everything else that
/// references a missing room or player is dropped after a debug log.
pub async fn route_event<P: QuestionProvider>(
    rooms: &Mutex<RoomRegistry<P>>,
    conn_id: ConnectionId,
    sender: &PlayerSender,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Join {
            room_id,
            username,
            mode,
            category,
        } => {
            let Some(room_id) = room_id.filter(|id| !id.is_empty()) else {
                reply_error(sender, ROOM_ID_REQUIRED);
                return;
            };
            let mut result =
                join_room(rooms, &room_id, mode, category.clone(), conn_id, &username, sender)
                    .await;
            // The room stopped between lookup and join (evicted, most
            // likely); the registry hands out a fresh one next time.
            if let Err(RoomError::Unavailable(_)) = result {
                tracing::debug!(%conn_id, %room_id, "room stopped during join, retrying");
                result = join_room(rooms, &room_id, mode, category, conn_id, &username, sender)
                    .await;
            }
            if let Err(e) = result {
                tracing::warn!(%conn_id, %room_id, error = %e, "join failed");
            }
        }

        ClientEvent::Start { room_id } => {
            let Some(handle) = lookup(rooms, room_id.as_ref()).await else {
                reply_error(sender, ROOM_NOT_FOUND);
                return;
            };
            match handle.start().await {
                Ok(outcome) => {
                    tracing::debug!(%conn_id, room_id = %handle.room_id(), ?outcome, "start handled");
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "start failed");
                }
            }
        }

        ClientEvent::Leave { room_id } => {
            let Some(handle) = lookup_or_ignore(rooms, &room_id, conn_id).await
            else {
                return;
            };
            if let Err(e) = handle.leave(conn_id).await {
                tracing::debug!(%conn_id, error = %e, "leave failed");
            }
        }

        ClientEvent::Answer {
            room_id,
            answer,
            time_taken,
        } => {
            let Some(handle) = lookup_or_ignore(rooms, &room_id, conn_id).await
            else {
                return;
            };
            if let Err(e) = handle.submit_answer(conn_id, answer, time_taken).await {
                tracing::debug!(%conn_id, error = %e, "answer failed");
            }
        }

        ClientEvent::RequestNext { room_id } => {
            let Some(handle) = lookup_or_ignore(rooms, &room_id, conn_id).await
            else {
                return;
            };
            if let Err(e) = handle.request_next().await {
                tracing::debug!(%conn_id, error = %e, "next request failed");
            }
        }
    }
}

/// Removes a connection from every room it may be in.
///
/// The registry is only locked long enough to copy the room handles.
pub(crate) async fn disconnect<P: QuestionProvider>(
    rooms: &Mutex<RoomRegistry<P>>,
    conn_id: ConnectionId,
) -> usize {
    let handles = rooms.lock().await.room_handles();
    leave_rooms(&handles, conn_id).await
}

async fn join_room<P: QuestionProvider>(
    rooms: &Mutex<RoomRegistry<P>>,
    room_id: &RoomId,
    mode: GameMode,
    category: Option<String>,
    conn_id: ConnectionId,
    username: &str,
    sender: &PlayerSender,
) -> Result<(), RoomError> {
    let handle = rooms.lock().await.get_or_create(room_id, mode, category);
    handle.join(conn_id, username, sender.clone()).await
}

async fn lookup<P: QuestionProvider>(
    rooms: &Mutex<RoomRegistry<P>>,
    room_id: Option<&RoomId>,
) -> Option<RoomHandle> {
    let room_id = room_id?;
    rooms.lock().await.get(room_id)
}

async fn lookup_or_ignore<P: QuestionProvider>(
    rooms: &Mutex<RoomRegistry<P>>,
    room_id: &RoomId,
    conn_id: ConnectionId,
) -> Option<RoomHandle> {
    let handle = lookup(rooms, Some(room_id)).await;
    if handle.is_none() {
        tracing::debug!(%conn_id, %room_id, "event for unknown room, ignoring");
    }
    handle
}

fn reply_error(sender: &PlayerSender, message: &str) {
    let _ = sender.send(ServerEvent::ErrorMsg {
        message: message.to_string(),
    });
}
