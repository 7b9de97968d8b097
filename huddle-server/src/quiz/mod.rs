mod generator;
mod routes;
mod store;

pub use generator::{GeminiGenerator, GeneratorError, QuestionGenerator};
pub use routes::{QuizApi, quiz_router};
pub use store::{InMemoryQuizStore, QuizStore, StoreError};
