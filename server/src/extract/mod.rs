//! Plain-text extraction from uploaded documents
//!
//! The document kind is chosen from the filename extension. Parsing is
//! CPU-bound and some PDF inputs make the parser panic, so it runs on the
//! blocking pool and a panic is reported as an extraction failure.

mod docx;
mod pdf;

use crate::error::{AppError, Result};
use axum::body::Bytes;

pub use docx::extract_docx_text;
pub use pdf::extract_pdf_text;

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Pick the kind from a filename, case-insensitively
    pub fn from_filename(filename: &str) -> Result<Self> {
        let lower = filename.trim().to_lowercase();

        if lower.ends_with(".pdf") {
            Ok(DocumentKind::Pdf)
        } else if lower.ends_with(".docx") {
            Ok(DocumentKind::Docx)
        } else {
            Err(AppError::UnsupportedFileType)
        }
    }
}

/// Extract the text of `data`, dispatching on the extension of `filename`
pub async fn extract_text(filename: &str, data: Bytes) -> Result<String> {
    let kind = DocumentKind::from_filename(filename)?;

    tracing::debug!("Extracting text from {:?} document: {} ({} bytes)", kind, filename, data.len());

    let text = tokio::task::spawn_blocking(move || match kind {
        DocumentKind::Pdf => extract_pdf_text(&data),
        DocumentKind::Docx => extract_docx_text(&data),
    })
    .await
    .map_err(|e| AppError::Extraction(format!("Parser aborted: {}", e)))??;

    tracing::debug!("Extracted {} characters from {}", text.chars().count(), filename);

    Ok(text)
}
