//! Document metadata records and the store that persists them

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier assigned by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Metadata for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    /// Name of the file on disk; unique across all records
    pub stored_file_name: String,
    /// Name the file had when it was uploaded
    pub original_file_name: String,
    pub uploaded_at: DateTime<Utc>,
    /// Cached scannable code as a `data:` URL
    pub code_data: Option<String>,
}

impl DocumentRecord {
    pub fn has_code(&self) -> bool {
        self.code_data.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// Payload for inserting a new record; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub stored_file_name: String,
    pub original_file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub code_data: Option<String>,
}

impl NewDocument {
    pub fn new(stored_file_name: impl Into<String>, original_file_name: impl Into<String>) -> Self {
        Self {
            stored_file_name: stored_file_name.into(),
            original_file_name: original_file_name.into(),
            uploaded_at: Utc::now(),
            code_data: None,
        }
    }

    pub fn with_uploaded_at(mut self, uploaded_at: DateTime<Utc>) -> Self {
        self.uploaded_at = uploaded_at;
        self
    }

    pub fn with_code_data(mut self, code_data: impl Into<String>) -> Self {
        self.code_data = Some(code_data.into());
        self
    }
}

/// Persistence for document records.
///
/// Implementations must reject an insert whose `stored_file_name` already
/// exists with [`DocqrError::RecordConflict`](crate::DocqrError::RecordConflict)
/// instead of overwriting.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new record and return it with its assigned id
    async fn insert(&self, document: NewDocument) -> Result<DocumentRecord>;

    /// All records, most recently uploaded first
    async fn list(&self) -> Result<Vec<DocumentRecord>>;

    /// Look up a record by id. Unknown or malformed ids yield `None`.
    async fn get(&self, id: &DocumentId) -> Result<Option<DocumentRecord>>;

    /// Look up a record by its stored file name
    async fn find_by_stored_name(&self, stored_file_name: &str) -> Result<Option<DocumentRecord>>;

    /// Cache the rendered code on a record.
    ///
    /// Returns `DocqrError::NotFound` if the record does not exist.
    async fn set_code_data(&self, id: &DocumentId, code_data: &str) -> Result<()>;

    /// Number of stored records
    async fn count(&self) -> Result<u64>;
}
