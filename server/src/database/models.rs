//! Database models
//!
//! Rust structs representing database entities.
//! Row types serialize with their column names; request payloads coming
//! from the browser use camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Registered account
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub signup_date: DateTime<Utc>,
}

/// Bearer session, keyed by the SHA-256 of the token
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token_hash: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// An uploaded document with its extracted text
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub file_name: String,
    /// Path of the original inside the object store
    pub file_path: String,
    pub extracted_text: String,
    pub upload_date: DateTime<Utc>,
}

/// Create note request
#[derive(Debug)]
pub struct CreateNoteRequest {
    pub user_id: String,
    pub title: String,
    pub file_name: String,
    pub file_path: String,
    pub extracted_text: String,
}

/// Free-form label attached to notes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// Note together with its tag names
#[derive(Debug, Clone, Serialize)]
pub struct NoteWithTags {
    #[serde(flatten)]
    pub note: Note,
    pub tags: Vec<String>,
}

/// A generated quiz
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quiz {
    pub id: String,
    pub note_id: String,
    pub user_id: String,
    pub quiz_date: DateTime<Utc>,
    pub total_questions: i64,
    /// Seconds
    pub time_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: String,
    pub quiz_id: String,
    pub question_text: String,
    pub question_type: String,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Answer {
    pub id: String,
    pub question_id: String,
    pub answer_text: String,
    pub is_correct: bool,
    pub position: i64,
}

/// Answer option as shown to a quiz taker (no correctness flag)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub answer_text: String,
}

/// Question with its options, in generation order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionWithOptions {
    pub id: String,
    pub question_text: String,
    pub question_type: String,
    pub answers: Vec<AnswerOption>,
}

/// Quiz ready to be taken
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizForTaking {
    pub quiz: Quiz,
    pub questions: Vec<QuestionWithOptions>,
}

/// One question as produced by the completion API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// Create quiz request
#[derive(Debug)]
pub struct CreateQuizRequest {
    pub note_id: String,
    pub user_id: String,
    pub time_limit: i64,
    pub questions: Vec<GeneratedQuestion>,
}

/// Stored outcome of one quiz attempt
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizResult {
    pub id: String,
    pub quiz_id: String,
    pub user_id: String,
    pub score: i64,
    pub attempt_date: DateTime<Utc>,
    /// Seconds
    pub time_taken: i64,
    pub feedback: String,
}

/// Create result request
#[derive(Debug)]
pub struct CreateResultRequest {
    pub quiz_id: String,
    pub user_id: String,
    pub score: i64,
    pub time_taken: i64,
    pub feedback: String,
}

/// Running totals across all of a user's attempts
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProgress {
    pub user_id: String,
    pub quizzes_taken: i64,
    pub total_score: i64,
    pub best_score: i64,
    pub last_quiz_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Question id paired with the id of its correct answer, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKey {
    pub question_id: String,
    pub correct_answer_id: Option<String>,
}

/// One entry of a quiz submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: String,
    #[serde(default)]
    pub answer_id: Option<String>,
}

/// Body of `POST /api/submit-quiz`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    pub quiz_id: String,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
    /// Seconds
    #[serde(default)]
    pub time_taken: i64,
}
