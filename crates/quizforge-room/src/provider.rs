//! The question provider hook and a JSON-backed question bank.
//!
//! Rooms don't care where questions come from. They hand a
//! [`QuestionRequest`] to a [`QuestionProvider`] once, on the first join,
//! and fall back to a fixed sequence if that fails.

use std::future::Future;

use quizforge_protocol::GameMode;
use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::Question;

/// What a room asks its provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    pub count: usize,
    /// Opaque to the room; passed through from the creating join.
    pub category: Option<String>,
    pub mode: GameMode,
}

impl QuestionRequest {
    /// The provider-side question type (`"boolean"` or `"multiple"`).
    pub fn kind(&self) -> &'static str {
        self.mode.question_kind()
    }
}

/// Errors a provider can report. Never surfaced to clients: the room
/// logs them and substitutes the fallback sequence.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The upstream source could not be reached.
    #[error("question source unavailable: {0}")]
    Unavailable(String),

    /// Nothing matched the requested category and type.
    #[error("no questions match the request")]
    NoQuestions,

    /// The bank file is not valid JSON or has the wrong shape.
    #[error("malformed question bank: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A bank entry breaks a question invariant.
    #[error("invalid question: {0}")]
    InvalidQuestion(String),
}

/// Supplies an ordered question sequence for a room.
///
/// Called at most once per room, from a task spawned by the room actor,
/// so implementations may take as long as they like.
pub trait QuestionProvider: Send + Sync + 'static {
    fn fetch(
        &self,
        request: QuestionRequest,
    ) -> impl Future<Output = Result<Vec<Question>, ProviderError>> + Send;
}

// ---------------------------------------------------------------------------
// QuestionBank
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct BankEntry {
    #[serde(flatten)]
    question: Question,
    /// `None` matches any requested category.
    #[serde(default)]
    category: Option<String>,
    /// `"boolean"` or `"multiple"`; `None` matches either.
    #[serde(default)]
    kind: Option<String>,
}

impl BankEntry {
    fn matches(&self, request: &QuestionRequest) -> bool {
        let category_ok = match (&request.category, &self.category) {
            (Some(wanted), Some(have)) if !wanted.is_empty() => wanted == have,
            _ => true,
        };
        let kind_ok = self
            .kind
            .as_deref()
            .is_none_or(|kind| kind == request.kind());
        category_ok && kind_ok
    }
}

#[derive(Debug, Deserialize)]
struct BankFile {
    questions: Vec<BankEntry>,
}

/// An in-memory question pool that serves random samples.
///
/// Loaded from JSON shaped like:
///
/// ```json
/// { "questions": [
///     { "question": "Octopuses have three hearts.",
///       "options": ["True", "False"], "correctAnswer": "True",
///       "category": "animals", "kind": "boolean" }
/// ] }
/// ```
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    entries: Vec<BankEntry>,
}

impl QuestionBank {
    /// A bank with no questions. Every fetch fails with
    /// [`ProviderError::NoQuestions`], so rooms always use the fallback.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses and validates a bank.
    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        let file: BankFile = serde_json::from_str(json)?;
        for entry in &file.questions {
            let q = &entry.question;
            if !q.options.contains(&q.correct_answer) {
                return Err(ProviderError::InvalidQuestion(format!(
                    "correct answer {:?} is not an option of {:?}",
                    q.correct_answer, q.prompt
                )));
            }
        }
        Ok(Self {
            entries: file.questions,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sample(&self, request: &QuestionRequest) -> Vec<Question> {
        let mut matching: Vec<Question> = self
            .entries
            .iter()
            .filter(|entry| entry.matches(request))
            .map(|entry| entry.question.clone())
            .collect();
        matching.shuffle(&mut rand::rng());
        matching.truncate(request.count);
        matching
    }
}

impl QuestionProvider for QuestionBank {
    async fn fetch(
        &self,
        request: QuestionRequest,
    ) -> Result<Vec<Question>, ProviderError> {
        let questions = self.sample(&request);
        if questions.is_empty() {
            return Err(ProviderError::NoQuestions);
        }
        tracing::debug!(
            count = questions.len(),
            kind = request.kind(),
            category = ?request.category,
            "sampled questions from bank"
        );
        Ok(questions)
    }
}
