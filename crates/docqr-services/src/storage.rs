//! Uploaded files on local disk
//!
//! Files live flat in one directory under their stored name. A stored name
//! is never reused: writing refuses to replace an existing file.

use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::error::{ServiceError, ServiceResult};

/// Name used when nothing usable is left of the uploaded file name
const FALLBACK_FILE_NAME: &str = "document.pdf";

/// Directory holding uploaded files.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage directory if it does not exist yet
    pub async fn ensure_root(&self) -> ServiceResult<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            ServiceError::Storage(format!(
                "cannot create upload directory {}: {e}",
                self.root.display()
            ))
        })
    }

    /// Path of a stored file. Rejects names that would leave the directory.
    pub fn path_for(&self, stored_name: &str) -> ServiceResult<PathBuf> {
        let valid = !stored_name.is_empty()
            && stored_name != "."
            && stored_name != ".."
            && !stored_name.contains(['/', '\\', '\0']);

        if !valid {
            return Err(ServiceError::Storage(format!(
                "invalid stored file name '{stored_name}'"
            )));
        }
        Ok(self.root.join(stored_name))
    }

    /// Write a new file; fails with `RecordConflict` if the name is taken
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn write_new(&self, stored_name: &str, bytes: &[u8]) -> ServiceResult<PathBuf> {
        let path = self.path_for(stored_name)?;
        self.ensure_root().await?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => ServiceError::RecordConflict(stored_name.to_string()),
                _ => ServiceError::Storage(format!("cannot create {}: {e}", path.display())),
            })?;

        let written = async {
            file.write_all(bytes).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(ServiceError::Storage(format!(
                "cannot write {}: {e}",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), "file stored");
        Ok(path)
    }

    /// Read a stored file
    pub async fn read(&self, stored_name: &str) -> ServiceResult<Vec<u8>> {
        let path = self.path_for(stored_name)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ServiceError::NotFound(format!("file {stored_name}")),
            _ => ServiceError::Storage(format!("cannot read {}: {e}", path.display())),
        })
    }

    /// Remove a stored file; a missing file is not an error
    pub async fn remove(&self, stored_name: &str) -> ServiceResult<()> {
        let path = self.path_for(stored_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServiceError::Storage(format!(
                "cannot remove {}: {e}",
                path.display()
            ))),
        }
    }

    /// Names of the `.pdf` files in the directory, sorted
    pub async fn list_pdfs(&self) -> ServiceResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            ServiceError::Storage(format!("cannot read {}: {e}", self.root.display()))
        })?;

        let mut names = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(ServiceError::Storage(format!(
                        "cannot read {}: {e}",
                        self.root.display()
                    )));
                }
            };

            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_file && name.to_ascii_lowercase().ends_with(".pdf") {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}

/// Reduce an uploaded file name to a safe single path component.
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]`
/// becomes `_`.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Stored name for an upload: `<unix millis>-<sanitized original>`
pub fn stored_file_name(original: &str, uploaded_at: DateTime<Utc>) -> String {
    format!(
        "{}-{}",
        uploaded_at.timestamp_millis(),
        sanitize_file_name(original)
    )
}
