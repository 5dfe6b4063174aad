//! Trivia room sessions for Quizforge.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! players, its question sequence and the timer that moves the game
//! forward. Nothing outside the actor mutates room state.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: create-if-absent lookup from [`RoomId`] to room
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomState`]: Lobby → InProgress → Finished
//! - [`RoomConfig`]: question timing, question count, eviction
//! - [`QuestionProvider`]: where question sequences come from
//! - [`compute_points`]: the scoring formula
//!
//! [`RoomId`]: quizforge_protocol::RoomId

mod config;
mod error;
mod players;
mod provider;
mod questions;
mod registry;
mod room;
mod scoring;

pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use players::{Player, PlayerRegistry};
pub use provider::{
    ProviderError, QuestionBank, QuestionProvider, QuestionRequest,
};
pub use questions::{
    Question, QuestionSequence, QuestionState, fallback_questions,
};
pub use registry::{RoomRegistry, idle_rooms, leave_rooms};
pub use room::{PlayerSender, RoomHandle, RoomInfo, StartOutcome};
pub use scoring::{ScoringRule, compute_points};
