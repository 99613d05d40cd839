//! Error types for the QuizNote server
//!
//! All errors use thiserror for structured error handling.
//! Each variant maps onto one HTTP status when it reaches a handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Quiz not found: {0}")]
    QuizNotFound(String),

    #[error("Quiz result not found: {0}")]
    ResultNotFound(String),

    #[error("Unsupported file type")]
    UnsupportedFileType,

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Completion API error: {0}")]
    Completion(String),

    #[error("Failed to parse generated questions: {0}")]
    MalformedCompletion(String),

    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFileType | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NoteNotFound(_) | AppError::QuizNotFound(_) | AppError::ResultNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client.
    ///
    /// Client errors carry their own text. Server errors collapse to a
    /// per-kind summary so driver and parser details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Extraction(_) => "Failed to extract text".to_string(),
            AppError::Completion(_) | AppError::HttpClient(_) => {
                "Failed to generate questions".to_string()
            }
            AppError::MalformedCompletion(_) => "Failed to parse generated questions".to_string(),
            err if err.status().is_server_error() => "Internal server error".to_string(),
            err => err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }

        let body = serde_json::json!({ "error": self.public_message() });
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
