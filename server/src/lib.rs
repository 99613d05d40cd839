//! QuizNote library
//!
//! This library exposes the server's router, services and the quiz-taking
//! state for the binary and for integration tests.

pub mod app;
pub mod attempt;
pub mod completion;
pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod storage;

pub use app::{build_state, router, AppState};
pub use attempt::QuizAttempt;
pub use config::Settings;
pub use error::{AppError, Result};
