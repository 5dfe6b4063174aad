//! Room configuration and state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room a registry creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// How long each question is shown to players.
    pub question_duration: Duration,

    /// Extra grace after `question_duration` before the room moves on,
    /// so answers sent in the last instant still land.
    pub advance_buffer: Duration,

    /// How many questions to request from the provider.
    pub question_count: usize,

    /// Evict a room once it has been Finished this long with no joins.
    /// `None` keeps finished rooms forever.
    pub evict_after: Option<Duration>,

    /// Bound on each room actor's command queue.
    pub channel_size: usize,
}

impl RoomConfig {
    /// Wall-clock budget for one question: duration plus buffer.
    pub fn phase_budget(&self) -> Duration {
        self.question_duration + self.advance_buffer
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            question_duration: Duration::from_secs(12),
            advance_buffer: Duration::from_millis(500),
            question_count: 10,
            evict_after: Some(Duration::from_secs(10 * 60)),
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Lobby → InProgress → Finished
/// ```
///
/// - **Lobby**: players gather, questions load in the background.
/// - **InProgress**: questions are live and the phase timer is armed.
/// - **Finished**: the last question elapsed and the leaderboard went out.
///   Joins are still accepted but nothing else happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Lobby,
    InProgress,
    Finished,
}

impl RoomState {
    /// Returns `true` if the game can still be started.
    pub fn is_lobby(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` while questions are being asked.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// The only state this one may move to, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Lobby => Some(Self::InProgress),
            Self::InProgress => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_state_next_follows_strict_order() {
        assert_eq!(RoomState::Lobby.next(), Some(RoomState::InProgress));
        assert_eq!(RoomState::InProgress.next(), Some(RoomState::Finished));
        assert_eq!(RoomState::Finished.next(), None);
    }

    #[test]
    fn test_room_state_can_transition_to() {
        assert!(RoomState::Lobby.can_transition_to(RoomState::InProgress));
        assert!(!RoomState::Lobby.can_transition_to(RoomState::Finished));
        assert!(!RoomState::Finished.can_transition_to(RoomState::Lobby));
    }

    #[test]
    fn test_room_state_predicates() {
        assert!(RoomState::Lobby.is_lobby());
        assert!(!RoomState::InProgress.is_lobby());
        assert!(RoomState::InProgress.is_active());
        assert!(!RoomState::Finished.is_active());
    }

    #[test]
    fn test_room_state_display() {
        assert_eq!(RoomState::Lobby.to_string(), "Lobby");
        assert_eq!(RoomState::InProgress.to_string(), "InProgress");
    }

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.question_duration, Duration::from_secs(12));
        assert_eq!(config.advance_buffer, Duration::from_millis(500));
        assert_eq!(config.phase_budget(), Duration::from_millis(12_500));
        assert_eq!(config.question_count, 10);
        assert_eq!(config.evict_after, Some(Duration::from_secs(600)));
    }
}
