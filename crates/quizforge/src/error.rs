//! Unified error type for the Quizforge server.

use quizforge_protocol::ProtocolError;
use quizforge_room::{ProviderError, RoomError};
use quizforge_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert layer errors
/// without ceremony.
#[derive(Debug, thiserror::Error)]
pub enum QuizforgeError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, actor gone).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The question bank could not be parsed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A file or socket operation outside the transport failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
