use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
pub struct QuizId(pub Uuid);

impl QuizId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuizId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One generated multiple-choice question, as produced by the generator
/// service. `correct_index` is stripped before the record is sent to a
/// participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    pub options: Vec<String>,
    pub correct_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizStatus {
    InProgress,
    Completed,
}

/// Accumulated state of one quiz attempt: the generated questions plus the
/// participant's chosen answer indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: QuizId,
    pub owner: String,
    pub qty: usize,
    pub questions: Vec<Question>,
    pub chosen_indices: Vec<usize>,
    pub score: Option<usize>,
    pub status: QuizStatus,
}

impl QuizAttempt {
    pub fn new(owner: String, qty: usize) -> Self {
        Self {
            id: QuizId::new(),
            owner,
            qty,
            questions: Vec::new(),
            chosen_indices: Vec::new(),
            score: None,
            status: QuizStatus::InProgress,
        }
    }
}
