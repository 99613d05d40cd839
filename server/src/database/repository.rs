//! Repository layer for database operations
//!
//! This module provides CRUD operations for all entities.
//! Multi-row writes (quiz generation, result recording, tagging) run in a
//! single transaction so a failure never leaves partial rows behind.

use super::models::*;
use crate::config::QUESTION_TYPE_MCQ;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ===== Users & Sessions =====

    /// Create a user; the email must not be registered yet
    pub async fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, signup_date)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("Email is already registered".to_string())
            }
            other => AppError::Database(other),
        })?;

        tracing::debug!("Created user: {}", id);
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn create_session(
        &self,
        user_id: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(Utc::now())
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created session for user: {}", user_id);
        Ok(session)
    }

    /// Resolve a session token hash to its user, ignoring expired sessions
    pub async fn find_session_user(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = ? AND s.expires_at > ?
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn delete_session(&self, token_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove sessions past their expiry, returns how many were removed
    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows)
    }

    // ===== Notes =====

    pub async fn create_note(&self, req: CreateNoteRequest) -> Result<Note> {
        let id = Uuid::new_v4().to_string();

        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (id, user_id, title, file_name, file_path, extracted_text, upload_date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.user_id)
        .bind(&req.title)
        .bind(&req.file_name)
        .bind(&req.file_path)
        .bind(&req.extracted_text)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created note: {}", id);
        Ok(note)
    }

    /// Get a note owned by `user_id`
    pub async fn get_note(&self, id: &str, user_id: &str) -> Result<Note> {
        sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NoteNotFound(id.to_string()))
    }

    /// List a user's notes, newest first
    pub async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT * FROM notes
            WHERE user_id = ?
            ORDER BY upload_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    /// Upsert tags by name and link them to a note
    pub async fn tag_note(&self, note_id: &str, names: &[String]) -> Result<Vec<Tag>> {
        let mut tx = self.pool.begin().await?;
        let mut tags = Vec::with_capacity(names.len());

        for name in names {
            sqlx::query("INSERT INTO tags (id, name) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
                .bind(Uuid::new_v4().to_string())
                .bind(name)
                .execute(&mut *tx)
                .await?;

            let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE name = ?")
                .bind(name)
                .fetch_one(&mut *tx)
                .await?;

            sqlx::query("INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?, ?)")
                .bind(note_id)
                .bind(&tag.id)
                .execute(&mut *tx)
                .await?;

            tags.push(tag);
        }

        tx.commit().await?;

        tracing::debug!("Tagged note {} with {} tags", note_id, tags.len());
        Ok(tags)
    }

    pub async fn list_note_tags(&self, note_id: &str) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT t.name FROM note_tags nt
            JOIN tags t ON t.id = nt.tag_id
            WHERE nt.note_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    // ===== Quizzes =====

    /// Insert a quiz with all of its questions and answers atomically
    ///
    /// An option is flagged correct when its text equals the generated
    /// `correct_answer` exactly.
    pub async fn create_quiz(&self, req: CreateQuizRequest) -> Result<(Quiz, Vec<Question>)> {
        let quiz_id = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;

        // Insert the quiz header
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (id, note_id, user_id, quiz_date, total_questions, time_limit)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&quiz_id)
        .bind(&req.note_id)
        .bind(&req.user_id)
        .bind(Utc::now())
        .bind(req.questions.len() as i64)
        .bind(req.time_limit)
        .fetch_one(&mut *tx)
        .await?;

        let mut questions = Vec::with_capacity(req.questions.len());

        for (position, generated) in req.questions.iter().enumerate() {
            // Insert the question, then its options in generation order
            let question = sqlx::query_as::<_, Question>(
                r#"
                INSERT INTO questions (id, quiz_id, question_text, question_type, position)
                VALUES (?, ?, ?, ?, ?)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&quiz_id)
            .bind(&generated.question)
            .bind(QUESTION_TYPE_MCQ)
            .bind(position as i64)
            .fetch_one(&mut *tx)
            .await?;

            for (option_position, option) in generated.options.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO answers (id, question_id, answer_text, is_correct, position)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(Uuid::new_v4().to_string())
                .bind(&question.id)
                .bind(option)
                .bind(*option == generated.correct_answer)
                .bind(option_position as i64)
                .execute(&mut *tx)
                .await?;
            }

            questions.push(question);
        }

        // Nothing is visible until every row is in
        tx.commit().await?;

        tracing::debug!("Created quiz: {} with {} questions", quiz_id, questions.len());
        Ok((quiz, questions))
    }

    /// Get a quiz owned by `user_id`
    pub async fn get_quiz(&self, id: &str, user_id: &str) -> Result<Quiz> {
        sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::QuizNotFound(id.to_string()))
    }

    /// Questions of a quiz with their options, without correctness flags
    pub async fn list_questions_with_options(&self, quiz_id: &str) -> Result<Vec<QuestionWithOptions>> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE quiz_id = ? ORDER BY position",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let answers = sqlx::query_as::<_, Answer>(
            r#"
            SELECT a.* FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE q.quiz_id = ?
            ORDER BY q.position, a.position
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let result = questions
            .into_iter()
            .map(|question| {
                let options = answers
                    .iter()
                    .filter(|a| a.question_id == question.id)
                    .map(|a| AnswerOption {
                        id: a.id.clone(),
                        answer_text: a.answer_text.clone(),
                    })
                    .collect();

                QuestionWithOptions {
                    id: question.id,
                    question_text: question.question_text,
                    question_type: question.question_type,
                    answers: options,
                }
            })
            .collect();

        Ok(result)
    }

    /// For every question of a quiz, the id of its first correct answer
    pub async fn answer_key(&self, quiz_id: &str) -> Result<Vec<AnswerKey>> {
        let rows = sqlx::query_as::<_, (String, Option<String>)>(
            r#"
            SELECT q.id,
                   (SELECT a.id FROM answers a
                    WHERE a.question_id = q.id AND a.is_correct = 1
                    ORDER BY a.position
                    LIMIT 1)
            FROM questions q
            WHERE q.quiz_id = ?
            ORDER BY q.position
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(question_id, correct_answer_id)| AnswerKey {
                question_id,
                correct_answer_id,
            })
            .collect())
    }

    // ===== Results & Progress =====

    /// Store a result and fold it into the user's progress totals
    pub async fn record_result(&self, req: CreateResultRequest) -> Result<(QuizResult, UserProgress)> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Record the attempt
        let result = sqlx::query_as::<_, QuizResult>(
            r#"
            INSERT INTO quiz_results (id, quiz_id, user_id, score, attempt_date, time_taken, feedback)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.quiz_id)
        .bind(&req.user_id)
        .bind(req.score)
        .bind(now)
        .bind(req.time_taken)
        .bind(&req.feedback)
        .fetch_one(&mut *tx)
        .await?;

        // Fold the score into the user's running progress
        let progress = sqlx::query_as::<_, UserProgress>(
            r#"
            INSERT INTO user_progress (user_id, quizzes_taken, total_score, best_score, last_quiz_id, updated_at)
            VALUES (?, 1, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                quizzes_taken = quizzes_taken + 1,
                total_score = total_score + excluded.total_score,
                best_score = MAX(best_score, excluded.best_score),
                last_quiz_id = excluded.last_quiz_id,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(&req.user_id)
        .bind(req.score)
        .bind(req.score)
        .bind(&req.quiz_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        // Commit result and progress together
        tx.commit().await?;

        tracing::debug!("Recorded result: {} for quiz: {}", id, req.quiz_id);
        Ok((result, progress))
    }

    /// Get a result owned by `user_id`
    pub async fn get_result(&self, id: &str, user_id: &str) -> Result<QuizResult> {
        sqlx::query_as::<_, QuizResult>("SELECT * FROM quiz_results WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::ResultNotFound(id.to_string()))
    }

    pub async fn get_progress(&self, user_id: &str) -> Result<Option<UserProgress>> {
        let progress = sqlx::query_as::<_, UserProgress>("SELECT * FROM user_progress WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;
    use chrono::Duration;

    async fn create_test_repo() -> Repository {
        Repository::new(create_memory_pool().await.unwrap())
    }

    async fn seed_note(repo: &Repository) -> (User, Note) {
        let user = repo.create_user("ada@example.com", "hash").await.unwrap();
        let note = repo
            .create_note(CreateNoteRequest {
                user_id: user.id.clone(),
                title: "bio.pdf".to_string(),
                file_name: "bio.pdf".to_string(),
                file_path: format!("{}/1_bio.pdf", user.id),
                extracted_text: "Cells are the unit of life.".to_string(),
            })
            .await
            .unwrap();
        (user, note)
    }

    fn question(text: &str, options: &[&str], correct: &str) -> GeneratedQuestion {
        GeneratedQuestion {
            question: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct.to_string(),
        }
    }

    async fn count(repo: &Repository, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(repo.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repo = create_test_repo().await;

        repo.create_user("ada@example.com", "h1").await.unwrap();
        let err = repo.create_user("ada@example.com", "h2").await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_session_lookup_respects_expiry() {
        let repo = create_test_repo().await;
        let user = repo.create_user("ada@example.com", "hash").await.unwrap();
        let now = Utc::now();

        repo.create_session(&user.id, "live", now + Duration::days(1)).await.unwrap();
        repo.create_session(&user.id, "stale", now - Duration::seconds(1)).await.unwrap();

        let found = repo.find_session_user("live", now).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id.clone()));
        assert!(repo.find_session_user("stale", now).await.unwrap().is_none());
        assert!(repo.find_session_user("unknown", now).await.unwrap().is_none());

        assert_eq!(repo.delete_expired_sessions(now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_notes_are_scoped_to_owner() {
        let repo = create_test_repo().await;
        let (user, note) = seed_note(&repo).await;
        let other = repo.create_user("eve@example.com", "hash").await.unwrap();

        assert_eq!(repo.get_note(&note.id, &user.id).await.unwrap().id, note.id);
        assert!(matches!(
            repo.get_note(&note.id, &other.id).await.unwrap_err(),
            AppError::NoteNotFound(_)
        ));
        assert!(repo.list_notes(&other.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tags_are_shared_by_name() {
        let repo = create_test_repo().await;
        let (user, note) = seed_note(&repo).await;
        let second = repo
            .create_note(CreateNoteRequest {
                user_id: user.id.clone(),
                title: "chem.docx".to_string(),
                file_name: "chem.docx".to_string(),
                file_path: "x".to_string(),
                extracted_text: "Atoms.".to_string(),
            })
            .await
            .unwrap();

        repo.tag_note(&note.id, &["Biology".to_string(), "Chapter 5".to_string()])
            .await
            .unwrap();
        repo.tag_note(&second.id, &["Biology".to_string()]).await.unwrap();

        assert_eq!(count(&repo, "tags").await, 2);
        assert_eq!(
            repo.list_note_tags(&note.id).await.unwrap(),
            vec!["Biology".to_string(), "Chapter 5".to_string()]
        );
        assert_eq!(repo.list_note_tags(&second.id).await.unwrap(), vec!["Biology".to_string()]);
    }

    #[tokio::test]
    async fn test_create_quiz_flags_correct_option() {
        let repo = create_test_repo().await;
        let (user, note) = seed_note(&repo).await;

        let (quiz, questions) = repo
            .create_quiz(CreateQuizRequest {
                note_id: note.id.clone(),
                user_id: user.id.clone(),
                time_limit: 600,
                questions: vec![
                    question("Unit of life?", &["Atom", "Cell", "Organ"], "Cell"),
                    question("Powerhouse?", &["Nucleus", "Mitochondria"], "Mitochondria"),
                ],
            })
            .await
            .unwrap();

        assert_eq!(quiz.total_questions, 2);
        assert_eq!(quiz.time_limit, 600);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question_type, "MCQ");

        let taking = repo.list_questions_with_options(&quiz.id).await.unwrap();
        assert_eq!(taking[0].question_text, "Unit of life?");
        let texts: Vec<&str> = taking[0].answers.iter().map(|a| a.answer_text.as_str()).collect();
        assert_eq!(texts, vec!["Atom", "Cell", "Organ"]);

        let key = repo.answer_key(&quiz.id).await.unwrap();
        assert_eq!(key.len(), 2);
        assert_eq!(key[0].correct_answer_id.as_deref(), Some(taking[0].answers[1].id.as_str()));
        assert_eq!(key[1].correct_answer_id.as_deref(), Some(taking[1].answers[1].id.as_str()));
    }

    #[tokio::test]
    async fn test_answer_key_without_matching_option() {
        let repo = create_test_repo().await;
        let (user, note) = seed_note(&repo).await;

        let (quiz, _) = repo
            .create_quiz(CreateQuizRequest {
                note_id: note.id,
                user_id: user.id,
                time_limit: 600,
                questions: vec![question("Q?", &["A", "B"], "C")],
            })
            .await
            .unwrap();

        let key = repo.answer_key(&quiz.id).await.unwrap();
        assert_eq!(key[0].correct_answer_id, None);
    }

    #[tokio::test]
    async fn test_failed_answer_insert_rolls_back_quiz() {
        let repo = create_test_repo().await;
        let (user, note) = seed_note(&repo).await;

        sqlx::query(
            "CREATE TRIGGER fail_answer BEFORE INSERT ON answers WHEN NEW.answer_text = 'boom' \
             BEGIN SELECT RAISE(ABORT, 'boom'); END",
        )
        .execute(repo.pool())
        .await
        .unwrap();

        let result = repo
            .create_quiz(CreateQuizRequest {
                note_id: note.id,
                user_id: user.id,
                time_limit: 600,
                questions: vec![
                    question("Fine?", &["Yes", "No"], "Yes"),
                    question("Broken?", &["boom", "No"], "No"),
                ],
            })
            .await;

        assert!(result.is_err());
        assert_eq!(count(&repo, "quizzes").await, 0);
        assert_eq!(count(&repo, "questions").await, 0);
        assert_eq!(count(&repo, "answers").await, 0);
    }

    #[tokio::test]
    async fn test_empty_option_text_is_stored() {
        let repo = create_test_repo().await;
        let (user, note) = seed_note(&repo).await;

        let (quiz, _) = repo
            .create_quiz(CreateQuizRequest {
                note_id: note.id,
                user_id: user.id,
                time_limit: 600,
                questions: vec![question("Blank first?", &["", "Yes"], "Yes")],
            })
            .await
            .unwrap();

        let taking = repo.list_questions_with_options(&quiz.id).await.unwrap();
        let texts: Vec<&str> = taking[0].answers.iter().map(|a| a.answer_text.as_str()).collect();
        assert_eq!(texts, vec!["", "Yes"]);

        let key = repo.answer_key(&quiz.id).await.unwrap();
        assert_eq!(key[0].correct_answer_id.as_deref(), Some(taking[0].answers[1].id.as_str()));
    }

    #[tokio::test]
    async fn test_record_result_accumulates_progress() {
        let repo = create_test_repo().await;
        let (user, note) = seed_note(&repo).await;
        let (quiz, _) = repo
            .create_quiz(CreateQuizRequest {
                note_id: note.id,
                user_id: user.id.clone(),
                time_limit: 600,
                questions: vec![question("Q?", &["A", "B"], "A")],
            })
            .await
            .unwrap();

        let (first, progress) = repo
            .record_result(CreateResultRequest {
                quiz_id: quiz.id.clone(),
                user_id: user.id.clone(),
                score: 4,
                time_taken: 90,
                feedback: "You scored 4 out of 5 questions.".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(first.score, 4);
        assert_eq!(progress.quizzes_taken, 1);
        assert_eq!(progress.best_score, 4);

        let (_, progress) = repo
            .record_result(CreateResultRequest {
                quiz_id: quiz.id.clone(),
                user_id: user.id.clone(),
                score: 2,
                time_taken: 30,
                feedback: "You scored 2 out of 5 questions.".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(progress.quizzes_taken, 2);
        assert_eq!(progress.total_score, 6);
        assert_eq!(progress.best_score, 4);
        assert_eq!(progress.last_quiz_id.as_deref(), Some(quiz.id.as_str()));

        let fetched = repo.get_result(&first.id, &user.id).await.unwrap();
        assert_eq!(fetched.time_taken, 90);
    }
}
