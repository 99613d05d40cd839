//! HTTP routes
//!
//! Each submodule exposes a `router()` merged into the API router.
//! Handlers return `crate::error::Result` so failures render as
//! `{ "error": message }` with the status of the error kind.

pub mod auth;
mod extract;
mod health;
mod notes;
mod quizzes;
mod results;

use crate::app::AppState;
use crate::error::AppError;
use axum::extract::rejection::JsonRejection;
use axum::Router;
use axum_typed_multipart::TypedMultipartError;

pub use auth::AuthUser;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(extract::router())
        .merge(auth::router())
        .merge(notes::router())
        .merge(quizzes::router())
        .merge(results::router())
}

pub(crate) fn json_rejection(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

pub(crate) fn multipart_rejection(rejection: TypedMultipartError) -> AppError {
    AppError::BadRequest(rejection.to_string())
}
