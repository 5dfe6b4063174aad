//! Wire protocol for Quizforge.
//!
//! This crate defines what travels between trivia clients and the server:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`RoomId`], [`GameMode`]):
//!   the inbound and outbound events, tagged by a `type` field.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing so.
//!
//! The protocol layer knows nothing about rooms or timers; it only knows
//! the shape of the messages.
//!
//! ```text
//! Transport (bytes) → Protocol (events) → Room (game state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use quizforge_transport::ConnectionId;
pub use types::{
    ClientEvent, GameMode, Recipient, RoomId, ScoreLine, ServerEvent,
    Standing,
};
