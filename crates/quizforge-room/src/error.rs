//! Error types for the room layer.

use quizforge_protocol::RoomId;

/// Errors that can occur during room operations.
///
/// Stale references (unknown player, answer outside a running game) are
/// not errors: the room ignores them and reports nothing.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room's command channel is closed (the actor has shut down).
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
