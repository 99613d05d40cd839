//! Client-side quiz-taking state
//!
//! Tracks the current question, the chosen option per question and the
//! countdown of one attempt. Nothing here is persisted; reloading a quiz
//! starts a fresh attempt. The countdown is informational only and is not
//! enforced when the attempt is submitted.

use crate::config::QUIZ_COUNTDOWN;
use crate::database::{QuestionWithOptions, QuizForTaking, SubmitQuizRequest, SubmittedAnswer};
use crate::error::{AppError, Result};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct QuizAttempt {
    quiz_id: String,
    questions: Vec<QuestionWithOptions>,
    selections: Vec<Option<String>>,
    current: usize,
    started_at: Instant,
    countdown: Duration,
}

impl QuizAttempt {
    pub fn new(quiz: QuizForTaking, started_at: Instant) -> Self {
        let selections = vec![None; quiz.questions.len()];

        Self {
            quiz_id: quiz.quiz.id,
            questions: quiz.questions,
            selections,
            current: 0,
            started_at,
            countdown: QUIZ_COUNTDOWN,
        }
    }

    pub fn quiz_id(&self) -> &str {
        &self.quiz_id
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&QuestionWithOptions> {
        self.questions.get(self.current)
    }

    /// Option chosen for the current question
    pub fn selection(&self) -> Option<&str> {
        self.selections.get(self.current)?.as_deref()
    }

    /// Choose an option of the current question, replacing any earlier choice
    pub fn select(&mut self, answer_id: &str) -> Result<()> {
        let question = self
            .questions
            .get(self.current)
            .ok_or_else(|| AppError::BadRequest("Quiz has no questions".to_string()))?;

        if !question.answers.iter().any(|a| a.id == answer_id) {
            return Err(AppError::BadRequest(format!(
                "Answer {} does not belong to question {}",
                answer_id, question.id
            )));
        }

        self.selections[self.current] = Some(answer_id.to_string());
        Ok(())
    }

    /// Moving on requires a choice for the current question
    pub fn can_advance(&self) -> bool {
        self.selection().is_some()
    }

    /// Go to the next question, staying on the last one
    ///
    /// Returns false when there is no selection yet.
    pub fn advance(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }

        self.current = (self.current + 1).min(self.questions.len().saturating_sub(1));
        true
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.questions.len()
    }

    /// Countdown left at `now`, zero once it has run out
    pub fn remaining(&self, now: Instant) -> Duration {
        self.countdown
            .saturating_sub(now.saturating_duration_since(self.started_at))
    }

    /// Submission payload; unanswered questions are sent with a null answer
    pub fn finish(&self, now: Instant) -> SubmitQuizRequest {
        let answers = self
            .questions
            .iter()
            .zip(&self.selections)
            .map(|(question, selection)| SubmittedAnswer {
                question_id: question.id.clone(),
                answer_id: selection.clone(),
            })
            .collect();

        SubmitQuizRequest {
            quiz_id: self.quiz_id.clone(),
            answers,
            time_taken: now.saturating_duration_since(self.started_at).as_secs() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{AnswerOption, Quiz};
    use chrono::Utc;

    fn quiz(question_count: usize) -> QuizForTaking {
        let questions = (0..question_count)
            .map(|q| QuestionWithOptions {
                id: format!("q{}", q),
                question_text: format!("Question {}?", q),
                question_type: "MCQ".to_string(),
                answers: (0..3)
                    .map(|a| AnswerOption {
                        id: format!("q{}a{}", q, a),
                        answer_text: format!("Option {}", a),
                    })
                    .collect(),
            })
            .collect();

        QuizForTaking {
            quiz: Quiz {
                id: "quiz-1".to_string(),
                note_id: "note-1".to_string(),
                user_id: "user-1".to_string(),
                quiz_date: Utc::now(),
                total_questions: question_count as i64,
                time_limit: 600,
            },
            questions,
        }
    }

    #[test]
    fn test_advance_requires_selection() {
        let mut attempt = QuizAttempt::new(quiz(3), Instant::now());

        assert!(!attempt.can_advance());
        assert!(!attempt.advance());
        assert_eq!(attempt.current_index(), 0);

        attempt.select("q0a1").unwrap();
        assert!(attempt.can_advance());
        assert!(attempt.advance());
        assert_eq!(attempt.current_index(), 1);
        assert!(!attempt.can_advance());
    }

    #[test]
    fn test_select_rejects_foreign_option() {
        let mut attempt = QuizAttempt::new(quiz(2), Instant::now());

        assert!(attempt.select("q1a0").is_err());
        assert!(attempt.selection().is_none());

        attempt.select("q0a0").unwrap();
        attempt.select("q0a2").unwrap();
        assert_eq!(attempt.selection(), Some("q0a2"));
    }

    #[test]
    fn test_advance_clamps_at_last_question() {
        let mut attempt = QuizAttempt::new(quiz(2), Instant::now());

        attempt.select("q0a0").unwrap();
        attempt.advance();
        assert!(attempt.is_last());

        attempt.select("q1a0").unwrap();
        assert!(attempt.advance());
        assert_eq!(attempt.current_index(), 1);
        assert!(attempt.is_last());
    }

    #[test]
    fn test_remaining_saturates() {
        let start = Instant::now();
        let attempt = QuizAttempt::new(quiz(1), start);

        assert_eq!(attempt.remaining(start), QUIZ_COUNTDOWN);
        assert_eq!(
            attempt.remaining(start + Duration::from_secs(60)),
            Duration::from_secs(540)
        );
        assert_eq!(attempt.remaining(start + Duration::from_secs(3600)), Duration::ZERO);
    }

    #[test]
    fn test_finish_builds_submission() {
        let start = Instant::now();
        let mut attempt = QuizAttempt::new(quiz(3), start);

        attempt.select("q0a2").unwrap();
        attempt.advance();
        attempt.select("q1a0").unwrap();

        let submission = attempt.finish(start + Duration::from_millis(95_700));

        assert_eq!(submission.quiz_id, "quiz-1");
        assert_eq!(submission.time_taken, 95);
        assert_eq!(
            submission.answers,
            vec![
                SubmittedAnswer { question_id: "q0".into(), answer_id: Some("q0a2".into()) },
                SubmittedAnswer { question_id: "q1".into(), answer_id: Some("q1a0".into()) },
                SubmittedAnswer { question_id: "q2".into(), answer_id: None },
            ]
        );

        // Overtime is still submitted
        let late = attempt.finish(start + Duration::from_secs(900));
        assert_eq!(late.time_taken, 900);
    }

    #[test]
    fn test_empty_quiz() {
        let mut attempt = QuizAttempt::new(quiz(0), Instant::now());

        assert!(attempt.is_last());
        assert!(attempt.current_question().is_none());
        assert!(attempt.select("anything").is_err());
        assert!(!attempt.advance());
        assert!(attempt.finish(Instant::now()).answers.is_empty());
    }
}
