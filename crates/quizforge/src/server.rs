//! `QuizforgeServer` builder and server loop.
//!
//! This is the composition root: it owns the room registry and hands it
//! to every connection handler. Transport → protocol → router → rooms.

use std::sync::{Arc, Weak};
use std::time::Duration;

use quizforge_protocol::{Codec, JsonCodec, RoomId};
use quizforge_room::{QuestionProvider, RoomConfig, RoomRegistry, idle_rooms};
use quizforge_transport::{Transport, WebSocketTransport};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::QuizforgeError;
use crate::handler::handle_connection;

/// Server-level settings. Room behaviour lives in [`RoomConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// A connection that sends no frame at all, not even a ping, for this
    /// long is closed.
    pub idle_timeout: Duration,
    /// How often finished rooms are checked for eviction.
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            idle_timeout: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<P: QuestionProvider, C: Codec> {
    pub(crate) rooms: Mutex<RoomRegistry<P>>,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Quizforge server.
///
/// # Example
///
/// ```rust,ignore
/// use quizforge::prelude::*;
///
/// let server = QuizforgeServerBuilder::new()
///     .bind("0.0.0.0:3001")
///     .build(QuestionBank::empty())
///     .await?;
/// server.run().await
/// ```
pub struct QuizforgeServerBuilder {
    server_config: ServerConfig,
    room_config: RoomConfig,
}

impl QuizforgeServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            server_config: ServerConfig::default(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.server_config.bind_addr = addr.to_string();
        self
    }

    /// Sets how long a silent connection is kept open.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.server_config.idle_timeout = timeout;
        self
    }

    /// Replaces the whole server configuration.
    pub fn server_config(mut self, config: ServerConfig) -> Self {
        self.server_config = config;
        self
    }

    /// Sets the configuration every room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the listener and assembles the server around `provider`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<P: QuestionProvider>(
        self,
        provider: P,
    ) -> Result<QuizforgeServer<P, JsonCodec>, QuizforgeError> {
        let transport =
            WebSocketTransport::bind(&self.server_config.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomRegistry::new(provider, self.room_config)),
            codec: JsonCodec,
            config: self.server_config,
        });

        Ok(QuizforgeServer { transport, state })
    }
}

impl Default for QuizforgeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Quizforge server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuizforgeServer<P: QuestionProvider, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<P, C>>,
}

impl<P, C> QuizforgeServer<P, C>
where
    P: QuestionProvider,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task per connection, plus the eviction sweeper
    /// when rooms are configured to expire. Runs until the task is dropped.
    pub async fn run(mut self) -> Result<(), QuizforgeError> {
        tracing::info!(addr = %self.state.config.bind_addr, "Quizforge server running");

        let evict_after = self.state.rooms.lock().await.config().evict_after;
        if let Some(idle) = evict_after {
            tokio::spawn(sweep_finished_rooms(
                Arc::downgrade(&self.state),
                self.state.config.sweep_interval,
                idle,
            ));
        }

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

/// Periodically evicts rooms that finished at least `idle` ago.
/// Exits once the server state is gone.
async fn sweep_finished_rooms<P: QuestionProvider, C: Codec>(
    state: Weak<ServerState<P, C>>,
    every: Duration,
    idle: Duration,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(state) = state.upgrade() else { break };

        let evicted = evict_idle_rooms(&state.rooms, idle).await;
        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "evicted finished rooms");
        }
    }
}

/// One eviction pass. Rooms are inspected and shut down with the registry
/// unlocked; the lock is only taken to copy handles and to remove entries.
pub(crate) async fn evict_idle_rooms<P: QuestionProvider>(
    rooms: &Mutex<RoomRegistry<P>>,
    idle: Duration,
) -> Vec<RoomId> {
    let handles = rooms.lock().await.room_handles();
    let candidates = idle_rooms(&handles, idle).await;
    if candidates.is_empty() {
        return candidates;
    }

    let removed: Vec<_> = {
        let mut rooms = rooms.lock().await;
        candidates.iter().filter_map(|room_id| rooms.remove(room_id)).collect()
    };
    for handle in &removed {
        let _ = handle.shutdown().await;
        tracing::info!(room_id = %handle.room_id(), "finished room evicted");
    }
    candidates
}

#[cfg(test)]
mod tests {
    use futures_util::FutureExt;
    use quizforge_protocol::{ConnectionId, GameMode};
    use quizforge_room::{ProviderError, Question, QuestionRequest};
    use tokio::sync::mpsc;

    use super::*;

    struct Offline;

    impl QuestionProvider for Offline {
        async fn fetch(
            &self,
            _request: QuestionRequest,
        ) -> Result<Vec<Question>, ProviderError> {
            Err(ProviderError::Unavailable("offline".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_pass_does_not_hold_the_registry() {
        let rooms = Mutex::new(RoomRegistry::new(Offline, RoomConfig::default()));
        let finished = rooms
            .lock()
            .await
            .get_or_create(&RoomId::new("done"), GameMode::Standard, None);
        let (tx, _rx) = mpsc::unbounded_channel();
        finished.join(ConnectionId::new(1), "A", tx).await.unwrap();
        finished.start().await.unwrap();
        // Three questions run out on their own, then the room sits idle.
        tokio::time::sleep(Duration::from_secs(700)).await;
        assert!(finished.info().await.unwrap().finished_idle.is_some());

        let mut pass = Box::pin(evict_idle_rooms(&rooms, Duration::from_secs(600)));
        assert!(pass.as_mut().now_or_never().is_none());
        assert!(rooms.try_lock().is_ok());

        assert_eq!(pass.await, vec![RoomId::new("done")]);
        assert_eq!(rooms.lock().await.room_count(), 0);
    }
}
