//! Filesystem object store for uploaded documents
//!
//! Originals are stored per user as `{user_id}/{unix_millis}_{filename}`
//! below the store root. The relative key is what gets recorded on the
//! note row.
//!
//! Example: "3f0c.../1760572800000_biology.pdf"

use crate::config::MAX_FILENAME_LENGTH;
use crate::error::{AppError, Result};
use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the root directory if needed
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Object store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Store an upload for `owner`, returns the object key
    pub async fn put(&self, owner: &str, filename: &str, data: &[u8]) -> Result<String> {
        let owner = sanitize_filename(owner);
        if owner.is_empty() {
            return Err(AppError::ObjectStore("Empty owner".to_string()));
        }

        let mut name = sanitize_filename(filename);
        if name.is_empty() {
            name = "upload".to_string();
        }

        let key = format!("{}/{}_{}", owner, Utc::now().timestamp_millis(), name);
        let path = self.resolve(&key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to temp file first, then rename into place
        let temp_path = path.with_extension("part");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &path).await?;

        tracing::debug!("Stored object: {} ({} bytes)", key, data.len());

        Ok(key)
    }

    /// Delete an object; deleting a missing object is not an error
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;

        if !fs::try_exists(&path).await? {
            return Ok(());
        }

        fs::remove_file(&path).await?;
        tracing::debug!("Deleted object: {}", key);

        Ok(())
    }

    /// Map a key to a path below the root, rejecting anything that could escape it
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if key.is_empty() || !is_plain {
            return Err(AppError::ObjectStore(format!("Invalid object key: {}", key)));
        }

        Ok(self.root.join(relative))
    }
}

/// Strip path separators and NUL bytes from a filename and bound its length
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| *c != '/' && *c != '\\' && *c != '\0')
        .take(MAX_FILENAME_LENGTH)
        .collect::<String>()
        .trim()
        .to_string()
}
