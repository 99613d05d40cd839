use super::{multipart_rejection, AuthUser};
use crate::app::AppState;
use crate::database::{Note, NoteWithTags};
use crate::error::{AppError, Result};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart, TypedMultipartError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notes", get(list_notes).post(upload_note))
        .route("/api/notes/{note_id}", get(get_note))
}

#[derive(Debug, TryFromMultipart)]
pub struct UploadNoteForm {
    #[form_data(limit = "25MiB")]
    pub file: Option<FieldData<Bytes>>,
    pub tags: Vec<String>,
}

async fn upload_note(
    auth: AuthUser,
    State(state): State<AppState>,
    form: std::result::Result<TypedMultipart<UploadNoteForm>, TypedMultipartError>,
) -> Result<(StatusCode, Json<NoteWithTags>)> {
    let TypedMultipart(UploadNoteForm { file, tags }) = form.map_err(multipart_rejection)?;
    let file = file.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    let filename = file.metadata.file_name.unwrap_or_default();

    let note = state
        .notes
        .upload(&auth.id, &filename, file.contents, &tags)
        .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

async fn list_notes(auth: AuthUser, State(state): State<AppState>) -> Result<Json<Vec<Note>>> {
    Ok(Json(state.notes.list_notes(&auth.id).await?))
}

async fn get_note(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(note_id): Path<String>,
) -> Result<Json<NoteWithTags>> {
    Ok(Json(state.notes.get_note(&note_id, &auth.id).await?))
}
