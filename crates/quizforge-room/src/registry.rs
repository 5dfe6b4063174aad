//! Room registry: the single owner of the `RoomId` → room mapping.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use quizforge_protocol::{ConnectionId, GameMode, RoomId};

use crate::room::spawn_room;
use crate::{QuestionProvider, RoomConfig, RoomError, RoomHandle, RoomInfo};

/// Tracks every live room and creates rooms on first reference.
///
/// Unlike a matchmaker, the registry never picks a room for a player:
/// clients name the room they want, and the first join that names an
/// unknown id creates it with that join's mode and category.
pub struct RoomRegistry<P: QuestionProvider> {
    rooms: HashMap<RoomId, RoomHandle>,
    provider: Arc<P>,
    config: RoomConfig,
}

impl<P: QuestionProvider> RoomRegistry<P> {
    /// Creates an empty registry whose rooms fetch from `provider`.
    pub fn new(provider: P, config: RoomConfig) -> Self {
        Self::with_shared(Arc::new(provider), config)
    }

    /// Like [`new`](Self::new), for a provider that's already shared.
    pub fn with_shared(provider: Arc<P>, config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            provider,
            config,
        }
    }

    /// Returns the room for `room_id`, spawning it if absent.
    ///
    /// `mode` and `category` only matter when the room is created here;
    /// an existing room keeps the settings of the join that created it.
    /// A room whose actor has stopped counts as absent.
    pub fn get_or_create(
        &mut self,
        room_id: &RoomId,
        mode: GameMode,
        category: Option<String>,
    ) -> RoomHandle {
        if let Some(handle) =
            self.rooms.get(room_id).filter(|handle| !handle.is_closed())
        {
            return handle.clone();
        }

        let handle = spawn_room(
            room_id.clone(),
            mode,
            category,
            self.config.clone(),
            Arc::clone(&self.provider),
        );
        self.rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(%room_id, %mode, "room created");
        handle
    }

    /// Looks up an existing room without creating it.
    pub fn get(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).cloned()
    }

    /// Returns cloned handles to all active rooms.
    ///
    /// Lets callers talk to rooms without holding the registry lock.
    pub fn room_handles(&self) -> Vec<RoomHandle> {
        self.rooms.values().cloned().collect()
    }

    /// Forgets a room without shutting it down.
    pub fn remove(&mut self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.remove(room_id)
    }

    /// Removes a connection from every room it may be in.
    ///
    /// Shared registries should snapshot [`room_handles`](Self::room_handles)
    /// and call [`leave_rooms`] instead, so the rooms are awaited without
    /// the registry borrowed.
    pub async fn disconnect(&self, conn: ConnectionId) -> usize {
        leave_rooms(&self.room_handles(), conn).await
    }

    /// Returns info about a specific room.
    pub async fn room_info(
        &self,
        room_id: &RoomId,
    ) -> Result<RoomInfo, RoomError> {
        let handle = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        handle.info().await
    }

    /// Shuts a room down and forgets it.
    pub async fn destroy_room(
        &mut self,
        room_id: &RoomId,
    ) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        let _ = handle.shutdown().await;

        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    /// Destroys every room that has sat Finished, with no join, for at
    /// least `idle`. Rooms whose actor already stopped are dropped too.
    ///
    /// Returns the ids that were removed.
    pub async fn evict_finished(&mut self, idle: Duration) -> Vec<RoomId> {
        let evicted = idle_rooms(&self.room_handles(), idle).await;
        for room_id in &evicted {
            if let Some(handle) = self.rooms.remove(room_id) {
                let _ = handle.shutdown().await;
            }
            tracing::info!(%room_id, "finished room evicted");
        }
        evicted
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all active room IDs.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().cloned().collect()
    }

    /// The config every new room is spawned with.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }
}

/// Asks every room in `handles` to drop `conn`, all at once.
///
/// Returns how many rooms actually held it. Each of those rooms
/// broadcasts its own lobby update.
pub async fn leave_rooms(handles: &[RoomHandle], conn: ConnectionId) -> usize {
    let replies = join_all(handles.iter().map(|handle| handle.leave(conn))).await;

    let mut left = 0;
    for reply in replies {
        match reply {
            Ok(true) => left += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::debug!(%conn, error = %e, "room gone during disconnect");
            }
        }
    }
    if left > 0 {
        tracing::info!(%conn, rooms = left, "connection removed from rooms");
    }
    left
}

/// Picks the rooms that have sat Finished, with no join, for at least
/// `idle`, plus any whose actor already stopped.
pub async fn idle_rooms(handles: &[RoomHandle], idle: Duration) -> Vec<RoomId> {
    let infos = join_all(handles.iter().map(|handle| handle.info())).await;

    handles
        .iter()
        .zip(infos)
        .filter(|(_, info)| match info {
            Ok(info) => info.finished_idle.is_some_and(|since| since >= idle),
            Err(_) => true,
        })
        .map(|(handle, _)| handle.room_id().clone())
        .collect()
}
