use super::{json_rejection, AuthUser};
use crate::app::AppState;
use crate::database::QuizForTaking;
use crate::error::{AppError, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/generate-quiz", post(generate_quiz))
        .route("/api/quizzes/{quiz_id}", get(get_quiz))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    #[serde(default)]
    pub note_id: Option<String>,
}

async fn generate_quiz(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerateQuizRequest>, JsonRejection>,
) -> Result<Json<QuizForTaking>> {
    let Json(req) = payload.map_err(json_rejection)?;

    let note_id = req
        .note_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Note ID is required".to_string()))?;

    Ok(Json(state.quizzes.generate(&auth.id, &note_id).await?))
}

async fn get_quiz(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> Result<Json<QuizForTaking>> {
    Ok(Json(state.quizzes.get_for_taking(&quiz_id, &auth.id).await?))
}
