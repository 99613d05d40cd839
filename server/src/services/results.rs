//! Quiz submission, results and progress
//!
//! Scoring compares each submitted answer id against the stored key. The
//! result row and the progress totals are written in one transaction.

use crate::database::{
    AnswerKey, CreateResultRequest, QuizResult, Repository, SubmitQuizRequest, SubmittedAnswer,
    UserProgress,
};
use crate::error::Result;
use chrono::Utc;
use serde::Serialize;

/// Response of a scored submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub success: bool,
    pub score: i64,
    pub total_questions: i64,
    pub quiz_result: QuizResult,
}

#[derive(Clone)]
pub struct ResultsService {
    repo: Repository,
}

impl ResultsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Score a submission and record the attempt
    pub async fn submit(&self, user_id: &str, req: SubmitQuizRequest) -> Result<SubmissionOutcome> {
        let quiz = self.repo.get_quiz(&req.quiz_id, user_id).await?;
        let keys = self.repo.answer_key(&quiz.id).await?;

        let score = score(&keys, &req.answers) as i64;
        let total_questions = keys.len() as i64;

        tracing::info!(
            "Scored quiz {} for user {}: {}/{}",
            quiz.id,
            user_id,
            score,
            total_questions
        );

        let (quiz_result, _) = self
            .repo
            .record_result(CreateResultRequest {
                quiz_id: quiz.id,
                user_id: user_id.to_string(),
                score,
                time_taken: req.time_taken.max(0),
                feedback: feedback(score, total_questions),
            })
            .await?;

        Ok(SubmissionOutcome {
            success: true,
            score,
            total_questions,
            quiz_result,
        })
    }

    pub async fn get_result(&self, id: &str, user_id: &str) -> Result<QuizResult> {
        self.repo.get_result(id, user_id).await
    }

    /// Progress totals; a user with no attempts gets zeros
    pub async fn progress(&self, user_id: &str) -> Result<UserProgress> {
        Ok(self
            .repo
            .get_progress(user_id)
            .await?
            .unwrap_or_else(|| UserProgress {
                user_id: user_id.to_string(),
                quizzes_taken: 0,
                total_score: 0,
                best_score: 0,
                last_quiz_id: None,
                updated_at: Utc::now(),
            }))
    }
}

/// Number of questions whose first submitted answer is the correct one
///
/// Only the first entry per question counts. Null answers never match,
/// and entries for questions outside the key are ignored.
pub fn score(keys: &[AnswerKey], answers: &[SubmittedAnswer]) -> usize {
    keys.iter()
        .filter(|key| {
            let submitted = answers
                .iter()
                .find(|a| a.question_id == key.question_id)
                .and_then(|a| a.answer_id.as_deref());

            matches!(
                (submitted, key.correct_answer_id.as_deref()),
                (Some(given), Some(correct)) if given == correct
            )
        })
        .count()
}

pub fn feedback(score: i64, total_questions: i64) -> String {
    format!("You scored {} out of {} questions.", score, total_questions)
}
