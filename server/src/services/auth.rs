//! Account and session service
//!
//! Email/password accounts with opaque bearer tokens. A token is valid
//! until logout or until its session expires.

use crate::config::{MIN_PASSWORD_LENGTH, SESSION_TTL_DAYS};
use crate::crypto;
use crate::database::{Repository, User};
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use serde::Serialize;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Token issued on signup or login
#[derive(Debug, Clone, Serialize)]
pub struct SessionGrant {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    repo: Repository,
}

impl AuthService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Register an account and open a session for it
    pub async fn signup(&self, email: &str, password: &str) -> Result<SessionGrant> {
        let email = normalize_email(email)?;

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let password_hash = crypto::hash_password(password)?;
        let user = self.repo.create_user(&email, &password_hash).await?;

        tracing::info!("Registered user: {}", user.id);

        self.open_session(user).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionGrant> {
        let email = email.trim().to_lowercase();

        let user = self
            .repo
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !crypto::verify_password(password, &user.password_hash)? {
            tracing::debug!("Password mismatch for user: {}", user.id);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        self.open_session(user).await
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        self.repo.delete_session(&crypto::hash_token(token)).await
    }

    /// Resolve a bearer token to its user
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        self.repo
            .find_session_user(&crypto::hash_token(token), Utc::now())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired session".to_string()))
    }

    /// Drop expired sessions, returns how many were removed
    pub async fn prune_sessions(&self) -> Result<u64> {
        let removed = self.repo.delete_expired_sessions(Utc::now()).await?;
        if removed > 0 {
            tracing::info!("Pruned {} expired sessions", removed);
        }
        Ok(removed)
    }

    async fn open_session(&self, user: User) -> Result<SessionGrant> {
        let token = crypto::generate_token();
        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);

        self.repo
            .create_session(&user.id, &crypto::hash_token(&token), expires_at)
            .await?;

        Ok(SessionGrant { token, user })
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::BadRequest("A valid email is required".to_string())),
    }
}
