use super::multipart_rejection;
use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::extract::extract_text;
use axum::body::Bytes;
use axum::routing::get;
use axum::{Json, Router};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart, TypedMultipartError};
use serde_json::{json, Value};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/extract-text", get(status).post(post_extract_text))
}

#[derive(Debug, TryFromMultipart)]
pub struct ExtractTextForm {
    #[form_data(limit = "25MiB")]
    pub file: Option<FieldData<Bytes>>,
}

async fn status() -> Json<Value> {
    Json(json!({ "message": "Extract text API is working" }))
}

async fn post_extract_text(
    form: std::result::Result<TypedMultipart<ExtractTextForm>, TypedMultipartError>,
) -> Result<Json<Value>> {
    let TypedMultipart(ExtractTextForm { file }) = form.map_err(multipart_rejection)?;
    let file = file.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    let filename = file.metadata.file_name.unwrap_or_default();
    let extracted_text = extract_text(&filename, file.contents).await?;

    Ok(Json(json!({ "extractedText": extracted_text })))
}
