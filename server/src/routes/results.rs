use super::{json_rejection, AuthUser};
use crate::app::AppState;
use crate::database::{QuizResult, SubmitQuizRequest, UserProgress};
use crate::error::Result;
use crate::services::SubmissionOutcome;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/submit-quiz", post(submit_quiz))
        .route("/api/results/{result_id}", get(get_result))
        .route("/api/progress", get(get_progress))
}

async fn submit_quiz(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: std::result::Result<Json<SubmitQuizRequest>, JsonRejection>,
) -> Result<Json<SubmissionOutcome>> {
    let Json(req) = payload.map_err(json_rejection)?;

    Ok(Json(state.results.submit(&auth.id, req).await?))
}

async fn get_result(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(result_id): Path<String>,
) -> Result<Json<QuizResult>> {
    Ok(Json(state.results.get_result(&result_id, &auth.id).await?))
}

async fn get_progress(auth: AuthUser, State(state): State<AppState>) -> Result<Json<UserProgress>> {
    Ok(Json(state.results.progress(&auth.id).await?))
}
