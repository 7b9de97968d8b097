use crate::quiz::generator::{GeneratorError, QuestionGenerator};
use crate::quiz::store::{QuizStore, StoreError};
use axum::Router;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use huddle_core::{Question, QuizAttempt, QuizId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

#[derive(Clone)]
pub struct QuizApi {
    pub store: Arc<dyn QuizStore>,
    pub generator: Arc<dyn QuestionGenerator>,
}

pub fn quiz_router(api: QuizApi) -> Router {
    Router::new()
        .route("/quiz/generate-id", post(generate_id))
        .route("/quiz/generate-quiz", post(generate_quiz))
        .route("/quiz/save-answer", post(save_answer))
        .route("/quiz/evaluate-answer", post(evaluate_answer))
        .route("/quiz/terminate-quiz", post(terminate_quiz))
        .route("/questions/generate-questions", post(generate_questions))
        .with_state(api)
}

enum ApiError {
    Store(StoreError),
    Generator(GeneratorError),
    BadRequest(&'static str),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<GeneratorError> for ApiError {
    fn from(e: GeneratorError) -> Self {
        Self::Generator(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Store(StoreError::NotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("quiz {id} not found"))
            }
            ApiError::Generator(e) => {
                error!("question generation failed: {}", e);
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_owned()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Question record as sent to a participant: the correct answer is stripped.
#[derive(Serialize)]
struct PublicQuestion {
    question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_snippet: Option<String>,
    options: Vec<String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            question: q.question,
            code_snippet: q.code_snippet,
            options: q.options,
        }
    }
}

#[derive(Deserialize)]
struct GenerateIdRequest {
    owner: String,
    qty: usize,
}

async fn generate_id(
    State(api): State<QuizApi>,
    Json(req): Json<GenerateIdRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let quiz_id = api.store.create(req.owner, req.qty).await;
    Ok(Json(json!({ "quiz_id": quiz_id })))
}

#[derive(Deserialize)]
struct GenerateQuizRequest {
    quiz_id: QuizId,
    topic: String,
    #[serde(default)]
    difficulty: Option<String>,
    qs_no: usize,
    qty: usize,
}

async fn generate_quiz(
    State(api): State<QuizApi>,
    Json(req): Json<GenerateQuizRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.topic.is_empty() {
        return Err(ApiError::BadRequest("topic is required"));
    }
    if req.qs_no > req.qty {
        return Ok(Json(json!({ "has_more_questions": false })));
    }

    let difficulty = req.difficulty.as_deref().unwrap_or("random");
    let question = api
        .generator
        .generate(&req.topic, 1, difficulty)
        .await?
        .into_iter()
        .next()
        .ok_or(ApiError::Generator(GeneratorError::Empty))?;

    api.store.append_question(req.quiz_id, question.clone()).await?;

    Ok(Json(json!({
        "question": PublicQuestion::from(question),
        "topic": req.topic,
        "difficulty": difficulty,
    })))
}

#[derive(Deserialize)]
struct SaveAnswerRequest {
    quiz_id: QuizId,
    selected_index: usize,
}

async fn save_answer(
    State(api): State<QuizApi>,
    Json(req): Json<SaveAnswerRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    api.store.append_answer(req.quiz_id, req.selected_index).await?;
    Ok(Json(json!({ "message": "answer submitted" })))
}

#[derive(Deserialize)]
struct QuizIdRequest {
    quiz_id: QuizId,
}

async fn evaluate_answer(
    State(api): State<QuizApi>,
    Json(req): Json<QuizIdRequest>,
) -> Result<Json<QuizAttempt>, ApiError> {
    let attempt = api.store.evaluate(req.quiz_id).await?;
    Ok(Json(attempt))
}

async fn terminate_quiz(
    State(api): State<QuizApi>,
    Json(req): Json<QuizIdRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    api.store.delete(req.quiz_id).await?;
    Ok(Json(json!({ "message": "quiz terminated" })))
}

#[derive(Deserialize)]
struct GenerateQuestionsRequest {
    topic: String,
    qty: usize,
    #[serde(default)]
    difficulty: Option<String>,
}

async fn generate_questions(
    State(api): State<QuizApi>,
    Json(req): Json<GenerateQuestionsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.qty == 0 {
        return Err(ApiError::BadRequest("qty must be positive"));
    }

    let difficulty = req.difficulty.as_deref().unwrap_or("random");
    let questions = api.generator.generate(&req.topic, req.qty, difficulty).await?;

    Ok(Json(json!({ "questions": questions })))
}
