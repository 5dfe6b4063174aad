//! Questions and the per-room question sequencer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One trivia question. Immutable once produced by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    /// Always one of `options`.
    pub correct_answer: String,
}

impl Question {
    /// Builds a question, adding `correct_answer` to `options` if the
    /// caller left it out.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        let correct_answer = correct_answer.into();
        let mut options = options;
        if !options.contains(&correct_answer) {
            options.push(correct_answer.clone());
        }
        Self {
            prompt: prompt.into(),
            options,
            correct_answer,
        }
    }

    /// Exact string comparison against the correct answer.
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

/// Substituted whenever the provider fails or comes back empty.
pub fn fallback_questions() -> Vec<Question> {
    let true_false = || vec!["True".to_string(), "False".to_string()];
    vec![
        Question::new(
            "The Great Wall of China is visible from the Moon with the naked eye.",
            true_false(),
            "False",
        ),
        Question::new(
            "Octopuses have three hearts.",
            true_false(),
            "True",
        ),
        Question::new(
            "Lightning never strikes the same place twice.",
            true_false(),
            "False",
        ),
    ]
}

// ---------------------------------------------------------------------------
// QuestionSequence
// ---------------------------------------------------------------------------

/// An ordered, read-only run of questions plus a cursor.
///
/// Invariant: `0 <= index() <= len()`.
#[derive(Debug, Clone)]
pub struct QuestionSequence {
    questions: Arc<[Question]>,
    cursor: usize,
}

impl QuestionSequence {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions: questions.into(),
            cursor: 0,
        }
    }

    /// The question under the cursor, or `None` once exhausted.
    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    /// Moves the cursor forward one question. Returns `true` if the
    /// sequence is now exhausted.
    pub fn advance(&mut self) -> bool {
        if self.cursor < self.questions.len() {
            self.cursor += 1;
        }
        self.is_exhausted()
    }

    /// Puts the cursor back on the first question.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.questions.len()
    }

    pub fn index(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Where a room's questions are in their one-time load.
///
/// `Fetching` is recorded before the provider is called, so a second join
/// during the fetch sees it and does not issue another request.
#[derive(Debug, Clone, Default)]
pub enum QuestionState {
    #[default]
    NotFetched,
    Fetching,
    Ready(QuestionSequence),
}

impl QuestionState {
    pub fn sequence(&self) -> Option<&QuestionSequence> {
        match self {
            Self::Ready(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn sequence_mut(&mut self) -> Option<&mut QuestionSequence> {
        match self {
            Self::Ready(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::Fetching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(prompt: &str) -> Question {
        Question::new(prompt, vec!["a".into(), "b".into()], "a")
    }

    #[test]
    fn test_new_adds_missing_correct_answer_to_options() {
        let question = Question::new("pick", vec!["x".into()], "y");
        assert_eq!(question.options, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_is_correct_is_exact_match() {
        let question = q("case");
        assert!(question.is_correct("a"));
        assert!(!question.is_correct("A"));
        assert!(!question.is_correct(" a"));
    }

    #[test]
    fn test_fallback_has_three_valid_questions() {
        let questions = fallback_questions();
        assert_eq!(questions.len(), 3);
        for question in &questions {
            assert!(question.options.contains(&question.correct_answer));
        }
    }

    #[test]
    fn test_sequence_walks_to_exhaustion() {
        let mut seq = QuestionSequence::new(vec![q("one"), q("two")]);
        assert_eq!(seq.index(), 0);
        assert_eq!(seq.current().unwrap().prompt, "one");

        assert!(!seq.advance());
        assert_eq!(seq.current().unwrap().prompt, "two");

        assert!(seq.advance());
        assert_eq!(seq.index(), 2);
        assert!(seq.current().is_none());
    }

    #[test]
    fn test_advance_never_moves_past_len() {
        let mut seq = QuestionSequence::new(vec![q("only")]);
        assert!(seq.advance());
        assert!(seq.advance());
        assert_eq!(seq.index(), seq.len());
    }

    #[test]
    fn test_rewind_returns_to_first_question() {
        let mut seq = QuestionSequence::new(vec![q("one"), q("two")]);
        seq.advance();
        seq.rewind();
        assert_eq!(seq.index(), 0);
        assert!(!seq.is_exhausted());
    }

    #[test]
    fn test_empty_sequence_is_exhausted_immediately() {
        let seq = QuestionSequence::new(Vec::new());
        assert!(seq.is_empty());
        assert!(seq.is_exhausted());
    }

    #[test]
    fn test_question_state_accessors() {
        let mut state = QuestionState::default();
        assert!(state.sequence().is_none());
        state = QuestionState::Fetching;
        assert!(state.is_fetching());
        state = QuestionState::Ready(QuestionSequence::new(vec![q("one")]));
        assert_eq!(state.sequence().map(QuestionSequence::len), Some(1));
        assert!(state.sequence_mut().is_some());
    }

    #[test]
    fn test_question_json_uses_question_key() {
        let json = serde_json::to_value(q("hello")).unwrap();
        assert_eq!(json["question"], "hello");
        assert_eq!(json["correctAnswer"], "a");
    }
}
