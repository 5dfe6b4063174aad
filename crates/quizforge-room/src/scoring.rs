//! Points awarded per answer.

use quizforge_protocol::GameMode;

/// The three components of a correct answer's award for one mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringRule {
    /// Points for any correct answer.
    pub base: u32,
    /// Answers at or under this many seconds earn `speed_bonus`.
    pub speed_window_secs: f64,
    pub speed_bonus: u32,
    /// Per-answer multiplier applied once a streak exceeds one.
    pub streak_multiplier: u32,
}

impl ScoringRule {
    /// The rule a room in `mode` scores with.
    pub const fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::MultipleCorrect => Self {
                base: 20,
                speed_window_secs: 8.0,
                speed_bonus: 15,
                streak_multiplier: 7,
            },
            GameMode::Standard => Self {
                base: 10,
                speed_window_secs: 5.0,
                speed_bonus: 10,
                streak_multiplier: 5,
            },
        }
    }

    /// Award for a correct answer. `streak` already counts this answer.
    pub fn award(&self, time_taken: f64, streak: u32) -> u32 {
        let speed = if time_taken <= self.speed_window_secs {
            self.speed_bonus
        } else {
            0
        };
        let streak_bonus = if streak > 1 {
            streak.saturating_mul(self.streak_multiplier)
        } else {
            0
        };
        self.base
            .saturating_add(speed)
            .saturating_add(streak_bonus)
    }
}

/// Points for one answer.
///
/// `streak` is the player's streak *after* counting this answer, so the
/// first correct answer in a row (streak 1) earns no streak bonus.
/// Incorrect answers are always worth 0.
pub fn compute_points(
    mode: GameMode,
    is_correct: bool,
    time_taken: f64,
    streak: u32,
) -> u32 {
    if !is_correct {
        return 0;
    }
    ScoringRule::for_mode(mode).award(time_taken, streak)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_fast_answer_on_streak_two() {
        // 10 base + 10 speed + 2 * 5 streak
        assert_eq!(compute_points(GameMode::Standard, true, 4.0, 2), 30);
    }

    #[test]
    fn test_multiple_correct_slow_answer_no_streak() {
        assert_eq!(compute_points(GameMode::MultipleCorrect, true, 10.0, 0), 20);
    }

    #[test]
    fn test_wrong_answer_is_always_zero() {
        for mode in [GameMode::Standard, GameMode::MultipleCorrect] {
            assert_eq!(compute_points(mode, false, 0.0, 9), 0);
            assert_eq!(compute_points(mode, false, 30.0, 0), 0);
        }
    }

    #[test]
    fn test_first_correct_answer_earns_no_streak_bonus() {
        assert_eq!(compute_points(GameMode::Standard, true, 3.0, 1), 20);
        assert_eq!(compute_points(GameMode::MultipleCorrect, true, 3.0, 1), 35);
    }

    #[test]
    fn test_speed_window_is_inclusive() {
        assert_eq!(compute_points(GameMode::Standard, true, 5.0, 1), 20);
        assert_eq!(compute_points(GameMode::Standard, true, 5.01, 1), 10);
        assert_eq!(compute_points(GameMode::MultipleCorrect, true, 8.0, 1), 35);
        assert_eq!(compute_points(GameMode::MultipleCorrect, true, 8.5, 1), 20);
    }

    #[test]
    fn test_multiple_correct_streak_bonus() {
        // 20 base + 15 speed + 3 * 7 streak
        assert_eq!(compute_points(GameMode::MultipleCorrect, true, 2.0, 3), 56);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let a = compute_points(GameMode::Standard, true, 4.2, 4);
        let b = compute_points(GameMode::Standard, true, 4.2, 4);
        assert_eq!(a, b);
    }
}
