//! Event types for the trivia wire format.
//!
//! Every frame is a JSON object whose `type` field names the event,
//! with camelCase field names (`roomId`, `timeTaken`, `totalQuestions`)
//! so browser clients can use them as-is.

use std::fmt;

use serde::{Deserialize, Serialize};

use quizforge_transport::ConnectionId;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Caller-supplied room identifier.
///
/// Rooms are not allocated by the server: the same string always names
/// the same room, and the first join for an unseen string creates it.
/// Serialized as the bare string.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps a room identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the empty string, which clients send when no room was
    /// chosen.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// Selects the scoring formula and the kind of questions a room asks.
///
/// Only `"multiple-correct"` is special. Every other string, including
/// `"standard"` and `"fact-fiction"`, deserializes as [`GameMode::Standard`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum GameMode {
    /// True/false ("fact or fiction") questions, fast 5 second bonus.
    #[default]
    Standard,
    /// Multiple choice questions, higher base award and 8 second bonus.
    MultipleCorrect,
}

impl GameMode {
    /// Parses a client-supplied mode string.
    pub fn parse(mode: &str) -> Self {
        match mode {
            "multiple-correct" => Self::MultipleCorrect,
            _ => Self::Standard,
        }
    }

    /// The wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::MultipleCorrect => "multiple-correct",
        }
    }

    /// The question type to ask the question provider for.
    pub fn question_kind(&self) -> &'static str {
        match self {
            Self::Standard => "boolean",
            Self::MultipleCorrect => "multiple",
        }
    }
}

impl From<String> for GameMode {
    fn from(mode: String) -> Self {
        Self::parse(&mode)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who a room event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connection currently in the room.
    Room,
    /// One connection only.
    Connection(ConnectionId),
}

// ---------------------------------------------------------------------------
// Inbound events
// ---------------------------------------------------------------------------

/// Events a client sends to the server.
///
/// `roomId` is optional on `join` and `start` because a missing room on
/// those two is answered with an `errorMsg`. On the others it is required
/// and a frame without it is dropped at decode time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Join (or create) a room.
    Join {
        #[serde(default)]
        room_id: Option<RoomId>,
        #[serde(default)]
        username: String,
        #[serde(default)]
        mode: GameMode,
        /// Passed through to the question provider untouched.
        #[serde(default)]
        category: Option<String>,
    },

    /// Leave a room.
    Leave { room_id: RoomId },

    /// Start the game in a room still in its lobby.
    Start {
        #[serde(default)]
        room_id: Option<RoomId>,
    },

    /// Answer the current question. `time_taken` is in seconds as
    /// measured by the client.
    Answer {
        room_id: RoomId,
        answer: String,
        time_taken: f64,
    },

    /// Skip the rest of the current question's timer.
    RequestNext { room_id: RoomId },
}

// ---------------------------------------------------------------------------
// Outbound events
// ---------------------------------------------------------------------------

/// A player's name and score, used for lobby snapshots and the final
/// leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub username: String,
    pub score: u32,
}

/// One row of the in-game scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLine {
    pub username: String,
    pub score: u32,
    pub correct: u32,
    pub wrong: u32,
}

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Current players in the room. Sent to the room after every join
    /// and leave.
    LobbyUpdate { players: Vec<Standing> },

    /// The game left the lobby.
    GameStarted { total_questions: usize },

    /// A new question is live. `duration` is in whole seconds.
    Question {
        index: usize,
        total: usize,
        question: String,
        options: Vec<String>,
        duration: u64,
    },

    /// Private verdict for the connection that answered.
    AnswerResult {
        is_correct: bool,
        earned: u32,
        correct_answer: String,
    },

    /// Full scoreboard after any answer.
    ScoreUpdate { players: Vec<ScoreLine> },

    /// Final standings, highest score first.
    GameOver { leaderboard: Vec<Standing> },

    /// Protocol error for the offending connection.
    ErrorMsg { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId::new("R1")).unwrap();
        assert_eq!(json, "\"R1\"");
    }

    #[test]
    fn test_room_id_blank_is_empty() {
        assert!(RoomId::new("").is_empty());
        assert!(RoomId::new("  ").is_empty());
        assert!(!RoomId::new("R1").is_empty());
    }

    #[test]
    fn test_game_mode_unknown_strings_are_standard() {
        let mode: GameMode = serde_json::from_str("\"fact-fiction\"").unwrap();
        assert_eq!(mode, GameMode::Standard);
        let mode: GameMode = serde_json::from_str("\"whatever\"").unwrap();
        assert_eq!(mode, GameMode::Standard);
        let mode: GameMode =
            serde_json::from_str("\"multiple-correct\"").unwrap();
        assert_eq!(mode, GameMode::MultipleCorrect);
    }

    #[test]
    fn test_game_mode_serializes_kebab_case() {
        let json = serde_json::to_string(&GameMode::MultipleCorrect).unwrap();
        assert_eq!(json, "\"multiple-correct\"");
        assert_eq!(GameMode::Standard.to_string(), "standard");
    }

    #[test]
    fn test_game_mode_question_kind() {
        assert_eq!(GameMode::Standard.question_kind(), "boolean");
        assert_eq!(GameMode::MultipleCorrect.question_kind(), "multiple");
    }

    #[test]
    fn test_join_decodes_with_all_fields() {
        let json = r#"{"type":"join","roomId":"R1","username":"ada",
                       "mode":"multiple-correct","category":"9"}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ClientEvent::Join {
                room_id: Some(RoomId::new("R1")),
                username: "ada".into(),
                mode: GameMode::MultipleCorrect,
                category: Some("9".into()),
            }
        );
    }

    #[test]
    fn test_join_without_room_id_still_decodes() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"join","username":"ada"}"#)
                .unwrap();
        match event {
            ClientEvent::Join { room_id, mode, .. } => {
                assert_eq!(room_id, None);
                assert_eq!(mode, GameMode::Standard);
            }
            other => panic!("expected Join, got {other:?}"),
        }
    }

    #[test]
    fn test_answer_decodes_time_taken() {
        let json = r#"{"type":"answer","roomId":"R1","answer":"True",
                       "timeTaken":3.5}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ClientEvent::Answer {
                room_id: RoomId::new("R1"),
                answer: "True".into(),
                time_taken: 3.5,
            }
        );
    }

    #[test]
    fn test_request_next_tag_is_camel_case() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"requestNext","roomId":"R1"}"#)
                .unwrap();
        assert!(matches!(event, ClientEvent::RequestNext { .. }));
    }

    #[test]
    fn test_leave_without_room_id_fails_to_decode() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"type":"leave"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_event_type_fails_to_decode() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"type":"chat","text":"hi"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_question_event_json_shape() {
        let event = ServerEvent::Question {
            index: 0,
            total: 3,
            question: "Water boils at 100C at sea level.".into(),
            options: vec!["True".into(), "False".into()],
            duration: 12,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "question");
        assert_eq!(json["index"], 0);
        assert_eq!(json["total"], 3);
        assert_eq!(json["duration"], 12);
        assert_eq!(json["options"][1], "False");
    }

    #[test]
    fn test_answer_result_json_shape() {
        let event = ServerEvent::AnswerResult {
            is_correct: true,
            earned: 20,
            correct_answer: "True".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "answerResult");
        assert_eq!(json["isCorrect"], true);
        assert_eq!(json["earned"], 20);
        assert_eq!(json["correctAnswer"], "True");
    }

    #[test]
    fn test_game_started_and_error_tags() {
        let json =
            serde_json::to_value(ServerEvent::GameStarted { total_questions: 3 })
                .unwrap();
        assert_eq!(json["type"], "gameStarted");
        assert_eq!(json["totalQuestions"], 3);

        let json = serde_json::to_value(ServerEvent::ErrorMsg {
            message: "Room not found".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "errorMsg");
        assert_eq!(json["message"], "Room not found");
    }

    #[test]
    fn test_score_update_rows() {
        let event = ServerEvent::ScoreUpdate {
            players: vec![ScoreLine {
                username: "ada".into(),
                score: 30,
                correct: 2,
                wrong: 1,
            }],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "scoreUpdate");
        assert_eq!(json["players"][0]["correct"], 2);
        assert_eq!(json["players"][0]["wrong"], 1);
    }
}
