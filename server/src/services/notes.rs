//! Notes service
//!
//! Upload pipeline for notes: extract text, keep the original in the
//! object store, record the note and its tags.

use crate::database::{CreateNoteRequest, Note, NoteWithTags, Repository};
use axum::body::Bytes;
use crate::error::Result;
use crate::extract;
use crate::storage::ObjectStore;

/// Service for managing notes
#[derive(Clone)]
pub struct NotesService {
    repo: Repository,
    store: ObjectStore,
}

impl NotesService {
    pub fn new(repo: Repository, store: ObjectStore) -> Self {
        Self { repo, store }
    }

    /// Create a note from an uploaded document
    pub async fn upload(
        &self,
        user_id: &str,
        filename: &str,
        data: Bytes,
        tags: &[String],
    ) -> Result<NoteWithTags> {
        tracing::info!(
            "Uploading note: {} for user: {} (size: {} bytes)",
            filename,
            user_id,
            data.len()
        );

        // Extract first; rejects unsupported extensions before anything is written
        let extracted_text = extract::extract_text(filename, data.clone()).await?;

        // Keep the original document
        let file_path = self.store.put(user_id, filename, &data).await?;

        // Record the note, dropping the stored file if that fails
        let req = CreateNoteRequest {
            user_id: user_id.to_string(),
            title: filename.to_string(),
            file_name: filename.to_string(),
            file_path: file_path.clone(),
            extracted_text,
        };

        let note = match self.repo.create_note(req).await {
            Ok(note) => note,
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&file_path).await {
                    tracing::warn!("Failed to remove orphaned upload {}: {}", file_path, cleanup);
                }
                return Err(e);
            }
        };

        // Link tags
        let tags = normalize_tags(tags);
        let tags = if tags.is_empty() {
            Vec::new()
        } else {
            self.repo
                .tag_note(&note.id, &tags)
                .await?
                .into_iter()
                .map(|tag| tag.name)
                .collect()
        };

        tracing::info!("Note created: {} with {} tags", note.id, tags.len());

        Ok(NoteWithTags { note, tags })
    }

    /// Get one of the user's notes with its tags
    pub async fn get_note(&self, id: &str, user_id: &str) -> Result<NoteWithTags> {
        let note = self.repo.get_note(id, user_id).await?;
        let tags = self.repo.list_note_tags(&note.id).await?;

        Ok(NoteWithTags { note, tags })
    }

    /// List the user's notes, newest first
    pub async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        self.repo.list_notes(user_id).await
    }
}

/// Trim, drop empties and duplicates, keep first-seen order
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());

    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_string());
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;
    use crate::error::AppError;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    async fn create_test_service() -> (NotesService, String, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = ObjectStore::new(temp_dir.path().to_path_buf());
        store.initialize().await.unwrap();

        let repo = Repository::new(create_memory_pool().await.unwrap());
        let user = repo.create_user("owner@example.com", "x").await.unwrap();

        (NotesService::new(repo, store), user.id, temp_dir)
    }

    fn docx(text: &str) -> Bytes {
        let xml = format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#,
            text
        );
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", FileOptions::<()>::default()).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner().into()
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            " biology ".to_string(),
            "".to_string(),
            "cells".to_string(),
            "biology".to_string(),
            "   ".to_string(),
        ];

        assert_eq!(normalize_tags(&tags), vec!["biology", "cells"]);
    }

    #[tokio::test]
    async fn test_upload_docx() {
        let (service, user_id, temp_dir) = create_test_service().await;
        let data = docx("The cell is the unit of life.");

        let note = service
            .upload(
                &user_id,
                "Cells.docx",
                data.clone(),
                &["biology".to_string(), "biology".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(note.note.title, "Cells.docx");
        assert_eq!(note.note.extracted_text.trim(), "The cell is the unit of life.");
        assert_eq!(note.tags, vec!["biology"]);
        assert!(note.note.file_path.starts_with(&format!("{}/", user_id)));
        assert!(note.note.file_path.ends_with("_Cells.docx"));
        let stored = std::fs::read(temp_dir.path().join(&note.note.file_path)).unwrap();
        assert_eq!(stored, data);

        let fetched = service.get_note(&note.note.id, &user_id).await.unwrap();
        assert_eq!(fetched.tags, vec!["biology"]);
        assert_eq!(service.list_notes(&user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_upload_writes_nothing() {
        let (service, user_id, temp_dir) = create_test_service().await;

        let err = service
            .upload(&user_id, "notes.txt", Bytes::from_static(b"plain"), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnsupportedFileType));
        assert!(service.list_notes(&user_id).await.unwrap().is_empty());
        assert!(!temp_dir.path().join(&user_id).exists());
    }

    #[tokio::test]
    async fn test_notes_are_owner_scoped() {
        let (service, user_id, _temp_dir) = create_test_service().await;

        let note = service
            .upload(&user_id, "a.docx", docx("text"), &[])
            .await
            .unwrap();

        let err = service.get_note(&note.note.id, "someone-else").await.unwrap_err();
        assert!(matches!(err, AppError::NoteNotFound(_)));
    }
}
