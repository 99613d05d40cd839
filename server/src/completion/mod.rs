//! Question synthesis through a chat-completion API
//!
//! [`QuestionGenerator`] is the seam between quiz generation and the
//! third-party model. The production implementation talks to an
//! OpenAI-compatible endpoint; tests substitute scripted generators.

mod openai;

use crate::database::GeneratedQuestion;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;

pub use openai::OpenAiGenerator;

/// Name of the function the model is forced to call
pub const GENERATE_QUESTIONS_TOOL: &str = "generate_questions";

pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that generates multiple-choice questions based on given text.";

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Produce up to `count` multiple-choice questions about `text`
    async fn generate(&self, text: &str, count: usize) -> Result<Vec<GeneratedQuestion>>;
}

pub fn user_prompt(text: &str, count: usize) -> String {
    format!(
        "Generate {} multiple-choice questions based on the following text:\n\n{}",
        count, text
    )
}

/// JSON schema of the `generate_questions` arguments
pub fn questions_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "question": { "type": "string" },
                        "options": { "type": "array", "items": { "type": "string" } },
                        "correct_answer": { "type": "string" }
                    },
                    "required": ["question", "options", "correct_answer"]
                }
            }
        },
        "required": ["questions"]
    })
}

#[derive(Deserialize)]
struct GeneratedQuestions {
    questions: Vec<GeneratedQuestion>,
}

/// Parse and shape-check the arguments of a `generate_questions` call
///
/// Only types and array shapes are checked; `correct_answer` is not
/// required to be one of the `options`.
pub fn parse_generated_questions(arguments: &str) -> Result<Vec<GeneratedQuestion>> {
    let parsed: GeneratedQuestions = serde_json::from_str(arguments).map_err(|e| {
        tracing::warn!("Unparseable function arguments: {}", arguments);
        AppError::MalformedCompletion(e.to_string())
    })?;

    if parsed.questions.is_empty() {
        return Err(AppError::MalformedCompletion("no questions returned".to_string()));
    }

    Ok(parsed.questions)
}
