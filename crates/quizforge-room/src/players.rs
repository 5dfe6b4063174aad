//! Per-room player records.

use quizforge_protocol::{ConnectionId, GameMode, ScoreLine, Standing};

use crate::compute_points;

/// One player in one room. Identified by the connection that joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: ConnectionId,
    pub username: String,
    /// Never decreases within a game.
    pub score: u32,
    /// Consecutive correct answers; any miss resets it to 0.
    pub streak: u32,
    pub correct: u32,
    pub wrong: u32,
}

impl Player {
    /// A fresh record with all counters at zero.
    pub fn new(id: ConnectionId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            score: 0,
            streak: 0,
            correct: 0,
            wrong: 0,
        }
    }

    /// Applies one answer and returns the points it earned.
    ///
    /// The streak is bumped before scoring, so the scoring formula sees
    /// the streak including this answer.
    pub fn record_answer(
        &mut self,
        mode: GameMode,
        is_correct: bool,
        time_taken: f64,
    ) -> u32 {
        if !is_correct {
            self.streak = 0;
            self.wrong += 1;
            return 0;
        }
        self.streak += 1;
        self.correct += 1;
        let earned = compute_points(mode, true, time_taken, self.streak);
        self.score = self.score.saturating_add(earned);
        earned
    }

    fn standing(&self) -> Standing {
        Standing {
            username: self.username.clone(),
            score: self.score,
        }
    }
}

/// Players in a room, in join order.
///
/// Rooms hold a handful of players, so a `Vec` with linear lookup keeps
/// iteration order stable without an extra index.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: Vec<Player>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh record for `id`. A connection that is already
    /// present is reset in place, keeping its position. Returns `true`
    /// if an existing record was overwritten.
    pub fn add(&mut self, id: ConnectionId, username: impl Into<String>) -> bool {
        let fresh = Player::new(id, username);
        match self.players.iter_mut().find(|p| p.id == id) {
            Some(existing) => {
                *existing = fresh;
                true
            }
            None => {
                self.players.push(fresh);
                false
            }
        }
    }

    /// Removes and returns the record for `id`, if present.
    pub fn remove(&mut self, id: ConnectionId) -> Option<Player> {
        let pos = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(pos))
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Copies of every record in registry order.
    pub fn snapshot(&self) -> Vec<Player> {
        self.players.clone()
    }

    /// Name and score of every player, in registry order.
    pub fn lobby(&self) -> Vec<Standing> {
        self.players.iter().map(Player::standing).collect()
    }

    /// Full scoreboard rows, in registry order.
    pub fn scoreboard(&self) -> Vec<ScoreLine> {
        self.players
            .iter()
            .map(|p| ScoreLine {
                username: p.username.clone(),
                score: p.score,
                correct: p.correct,
                wrong: p.wrong,
            })
            .collect()
    }

    /// Highest score first. Ties keep registry order (stable sort).
    pub fn leaderboard(&self) -> Vec<Standing> {
        let mut board = self.lobby();
        board.sort_by(|a, b| b.score.cmp(&a.score));
        board
    }
}
