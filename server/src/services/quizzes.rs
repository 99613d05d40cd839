//! Quiz generation service
//!
//! Turns a note's text into a stored quiz through the question generator.
//! At most one generation runs per note at a time.

use crate::completion::QuestionGenerator;
use crate::config::{DEFAULT_TIME_LIMIT_SECS, QUESTIONS_PER_QUIZ};
use crate::database::{CreateQuizRequest, QuizForTaking, Repository};
use crate::error::{AppError, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct QuizService {
    repo: Repository,
    generator: Arc<dyn QuestionGenerator>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Holds a note's generation slot until dropped
struct GenerationSlot {
    in_flight: Arc<Mutex<HashSet<String>>>,
    note_id: String,
}

impl Drop for GenerationSlot {
    fn drop(&mut self) {
        if let Ok(mut notes) = self.in_flight.lock() {
            notes.remove(&self.note_id);
        }
    }
}

impl QuizService {
    pub fn new(repo: Repository, generator: Arc<dyn QuestionGenerator>) -> Self {
        Self {
            repo,
            generator,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Generate and store a quiz for one of the user's notes
    pub async fn generate(&self, user_id: &str, note_id: &str) -> Result<QuizForTaking> {
        let note = self.repo.get_note(note_id, user_id).await.map_err(|e| match e {
            AppError::NoteNotFound(_) => AppError::BadRequest("Failed to fetch note".to_string()),
            other => other,
        })?;

        if note.extracted_text.trim().is_empty() {
            return Err(AppError::BadRequest("Note content is empty".to_string()));
        }

        let _slot = self.claim(&note.id)?;

        tracing::info!("Generating quiz for note: {}", note.id);

        let questions = self
            .generator
            .generate(&note.extracted_text, QUESTIONS_PER_QUIZ)
            .await?;

        let (quiz, _) = self
            .repo
            .create_quiz(CreateQuizRequest {
                note_id: note.id.clone(),
                user_id: user_id.to_string(),
                time_limit: DEFAULT_TIME_LIMIT_SECS,
                questions,
            })
            .await?;

        tracing::info!(
            "Quiz created: {} ({} questions) for note: {}",
            quiz.id,
            quiz.total_questions,
            note.id
        );

        let questions = self.repo.list_questions_with_options(&quiz.id).await?;

        Ok(QuizForTaking { quiz, questions })
    }

    /// Load a quiz for taking; options carry no correctness flag
    pub async fn get_for_taking(&self, quiz_id: &str, user_id: &str) -> Result<QuizForTaking> {
        let quiz = self.repo.get_quiz(quiz_id, user_id).await?;
        let questions = self.repo.list_questions_with_options(&quiz.id).await?;

        Ok(QuizForTaking { quiz, questions })
    }

    fn claim(&self, note_id: &str) -> Result<GenerationSlot> {
        let mut notes = self
            .in_flight
            .lock()
            .map_err(|_| AppError::Generic("Generation registry poisoned".to_string()))?;

        if !notes.insert(note_id.to_string()) {
            tracing::warn!("Rejected concurrent generation for note: {}", note_id);
            return Err(AppError::Conflict(
                "Quiz generation already in progress for this note".to_string(),
            ));
        }

        Ok(GenerationSlot {
            in_flight: Arc::clone(&self.in_flight),
            note_id: note_id.to_string(),
        })
    }
}
