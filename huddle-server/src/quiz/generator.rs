use async_trait::async_trait;
use huddle_core::Question;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generator request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("generator returned no text")]
    Empty,
    #[error("generator returned invalid JSON: {raw}")]
    InvalidJson { raw: String },
}

/// Boundary to the generative-text provider. The rest of the system only
/// sees question records coming back.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(
        &self,
        topic: &str,
        count: usize,
        difficulty: &str,
    ) -> Result<Vec<Question>, GeneratorError>;
}

/// Gemini `generateContent` client.
pub struct GeminiGenerator {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: String,
}

impl GeminiGenerator {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    fn prompt(topic: &str, count: usize, difficulty: &str) -> String {
        format!(
            "You are an interview quiz generator. Generate {count} MCQ interview \
             questions with answers for the topic: {topic} in {difficulty} difficulty.\n\
             Output format must be JSON:\n\
             [{{\"question\": \"...\", \"code_snippet\": \"optional\", \
             \"options\": [\"...\", \"...\", \"...\", \"...\"], \"correct_index\": 0}}]\n\
             Ensure JSON is valid, do not include extra markdown or explanations."
        )
    }

    async fn complete(&self, prompt: String) -> Result<String, GeneratorError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response: GeminiResponse = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(GeneratorError::Empty)
    }
}

#[async_trait]
impl QuestionGenerator for GeminiGenerator {
    async fn generate(
        &self,
        topic: &str,
        count: usize,
        difficulty: &str,
    ) -> Result<Vec<Question>, GeneratorError> {
        let raw = self.complete(Self::prompt(topic, count, difficulty)).await?;
        debug!("raw generator output: {} bytes", raw.len());

        let cleaned = strip_fences(&raw);
        serde_json::from_str(cleaned).map_err(|_| GeneratorError::InvalidJson {
            raw: cleaned.to_owned(),
        })
    }
}

/// Models routinely wrap their JSON in Markdown fences despite the prompt.
pub(crate) fn strip_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_fences() {
        let fenced = "```json\n[{\"a\": 1}]\n```";
        assert_eq!(strip_fences(fenced), "[{\"a\": 1}]");

        let bare = "[{\"a\": 1}]";
        assert_eq!(strip_fences(bare), bare);
    }

    #[test]
    fn parses_question_records() {
        let raw = r#"```json
        [{"question": "What does ownership mean?",
          "options": ["a", "b", "c", "d"],
          "correct_index": 2}]
        ```"#;
        let questions: Vec<Question> = serde_json::from_str(strip_fences(raw)).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_index, 2);
        assert!(questions[0].code_snippet.is_none());
    }
}
