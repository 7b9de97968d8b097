use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::{Question, QuizAttempt, QuizId, QuizStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("quiz {0} not found")]
    NotFound(QuizId),
}

/// Persistence boundary for quiz attempts: create / find / append / delete.
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn create(&self, owner: String, qty: usize) -> QuizId;
    async fn find(&self, id: QuizId) -> Result<QuizAttempt, StoreError>;
    async fn append_question(&self, id: QuizId, question: Question) -> Result<(), StoreError>;
    async fn append_answer(&self, id: QuizId, chosen_index: usize) -> Result<(), StoreError>;
    /// Scores the attempt (count of chosen indices matching the questions'
    /// correct indices), marks it completed, and returns the final record.
    async fn evaluate(&self, id: QuizId) -> Result<QuizAttempt, StoreError>;
    async fn delete(&self, id: QuizId) -> Result<(), StoreError>;
}

/// Process-lifetime store, same lifetime model as the session registry.
#[derive(Default)]
pub struct InMemoryQuizStore {
    attempts: DashMap<QuizId, QuizAttempt>,
}

impl InMemoryQuizStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizStore for InMemoryQuizStore {
    async fn create(&self, owner: String, qty: usize) -> QuizId {
        let attempt = QuizAttempt::new(owner, qty);
        let id = attempt.id;
        self.attempts.insert(id, attempt);
        id
    }

    async fn find(&self, id: QuizId) -> Result<QuizAttempt, StoreError> {
        self.attempts
            .get(&id)
            .map(|a| a.clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn append_question(&self, id: QuizId, question: Question) -> Result<(), StoreError> {
        let mut attempt = self.attempts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        attempt.questions.push(question);
        Ok(())
    }

    async fn append_answer(&self, id: QuizId, chosen_index: usize) -> Result<(), StoreError> {
        let mut attempt = self.attempts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        attempt.chosen_indices.push(chosen_index);
        Ok(())
    }

    async fn evaluate(&self, id: QuizId) -> Result<QuizAttempt, StoreError> {
        let mut attempt = self.attempts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let score = attempt
            .questions
            .iter()
            .zip(attempt.chosen_indices.iter())
            .filter(|(q, chosen)| q.correct_index == **chosen)
            .count();
        attempt.score = Some(score);
        attempt.status = QuizStatus::Completed;
        Ok(attempt.clone())
    }

    async fn delete(&self, id: QuizId) -> Result<(), StoreError> {
        self.attempts
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
