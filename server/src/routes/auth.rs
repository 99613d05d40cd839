use super::json_rejection;
use crate::app::AppState;
use crate::database::User;
use crate::error::{AppError, Result};
use crate::services::SessionGrant;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::ops::Deref;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/session", get(session))
}

/// The caller, resolved from `Authorization: Bearer <token>`
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?
            .to_string();

        let user = state.auth.authenticate(&token).await?;

        Ok(Self { user, token })
    }
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

async fn signup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionGrant>)> {
    let Json(credentials) = payload.map_err(json_rejection)?;

    let grant = state
        .auth
        .signup(&credentials.email, &credentials.password)
        .await?;

    Ok((StatusCode::CREATED, Json(grant)))
}

async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<SessionGrant>> {
    let Json(credentials) = payload.map_err(json_rejection)?;

    let grant = state
        .auth
        .login(&credentials.email, &credentials.password)
        .await?;

    Ok(Json(grant))
}

async fn logout(auth: AuthUser, State(state): State<AppState>) -> Result<StatusCode> {
    state.auth.logout(&auth.token).await?;

    tracing::info!("User logged out: {}", auth.id);

    Ok(StatusCode::NO_CONTENT)
}

async fn session(auth: AuthUser) -> Json<Value> {
    Json(json!({ "user": auth.user }))
}
