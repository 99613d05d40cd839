//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::completion::{OpenAiGenerator, QuestionGenerator};
use crate::config::{Settings, MAX_UPLOAD_BYTES};
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::middleware::request_tracing;
use crate::routes;
use crate::services::{AuthService, NotesService, QuizService, ResultsService};
use crate::storage::ObjectStore;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;

/// Multipart framing around the largest accepted upload
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub auth: AuthService,
    pub notes: NotesService,
    pub quizzes: QuizService,
    pub results: ResultsService,
}

impl AppState {
    pub fn new(repo: Repository, store: ObjectStore, generator: Arc<dyn QuestionGenerator>) -> Self {
        Self {
            auth: AuthService::new(repo.clone()),
            notes: NotesService::new(repo.clone(), store),
            quizzes: QuizService::new(repo.clone(), generator),
            results: ResultsService::new(repo.clone()),
            repo,
        }
    }
}

/// Open the database and object store and build the production state
pub async fn build_state(settings: &Settings) -> Result<AppState> {
    tracing::info!("Data directory: {:?}", settings.data_dir);

    tokio::fs::create_dir_all(&settings.data_dir).await?;

    let pool = create_pool(&settings.database_path()).await?;
    let repo = Repository::new(pool);

    let store = ObjectStore::new(settings.uploads_dir());
    store.initialize().await?;

    let generator = OpenAiGenerator::new(
        &settings.openai_base_url,
        settings.openai_api_key.clone(),
        settings.openai_model.clone(),
        settings.completion_timeout(),
    )?;

    let state = AppState::new(repo, store, Arc::new(generator));

    state.auth.prune_sessions().await?;

    tracing::info!("Application initialized successfully");

    Ok(state)
}

pub fn router(state: AppState) -> Router {
    routes::api_router()
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES))
        .layer(axum::middleware::from_fn(request_tracing))
        .with_state(state)
}
