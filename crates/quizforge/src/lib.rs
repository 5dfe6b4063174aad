//! # Quizforge
//!
//! Server-authoritative multiplayer trivia over WebSocket.
//!
//! Clients name a room and join it; the first join creates the room and
//! loads its questions. The server owns everything that matters: which
//! question is live, when it expires, who answered what and how many
//! points that was worth.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quizforge::prelude::*;
//!
//! # async fn run() -> Result<(), QuizforgeError> {
//! let server = QuizforgeServerBuilder::new()
//!     .bind("0.0.0.0:3001")
//!     .build(QuestionBank::empty())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod router;
mod server;

pub use error::QuizforgeError;
pub use router::route_event;
pub use server::{QuizforgeServer, QuizforgeServerBuilder, ServerConfig};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{
        QuizforgeError, QuizforgeServer, QuizforgeServerBuilder, ServerConfig,
    };
    pub use quizforge_protocol::{
        ClientEvent, Codec, ConnectionId, GameMode, JsonCodec, RoomId,
        ScoreLine, ServerEvent, Standing,
    };
    pub use quizforge_room::{
        ProviderError, Question, QuestionBank, QuestionProvider,
        QuestionRequest, RoomConfig, RoomRegistry, RoomState,
    };
}
