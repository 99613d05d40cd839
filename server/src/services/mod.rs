//! Services module
//!
//! Business logic services that coordinate between route handlers and the repository.

pub mod auth;
pub mod notes;
pub mod quizzes;
pub mod results;

pub use auth::{AuthService, SessionGrant};
pub use notes::NotesService;
pub use quizzes::QuizService;
pub use results::{ResultsService, SubmissionOutcome};
