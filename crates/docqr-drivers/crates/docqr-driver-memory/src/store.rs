//! Document records held in memory

use async_trait::async_trait;
use docqr_core::{DocqrError, DocumentId, DocumentRecord, DocumentStore, NewDocument, Result};
use parking_lot::RwLock;

/// [`DocumentStore`] backed by a vector in insertion order.
#[derive(Default)]
pub struct MemoryDocumentStore {
    records: RwLock<Vec<DocumentRecord>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, document: NewDocument) -> Result<DocumentRecord> {
        let mut records = self.records.write();
        if records
            .iter()
            .any(|r| r.stored_file_name == document.stored_file_name)
        {
            return Err(DocqrError::RecordConflict(document.stored_file_name));
        }

        let record = DocumentRecord {
            id: DocumentId::new(uuid::Uuid::new_v4().simple().to_string()),
            stored_file_name: document.stored_file_name,
            original_file_name: document.original_file_name,
            uploaded_at: document.uploaded_at,
            code_data: document.code_data,
        };
        records.push(record.clone());

        tracing::debug!(id = %record.id, stored_file_name = %record.stored_file_name, "document inserted");
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<DocumentRecord>> {
        // Reverse first so equal timestamps keep the latest insert in front.
        let mut records: Vec<DocumentRecord> = self.records.read().iter().rev().cloned().collect();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(records)
    }

    async fn get(&self, id: &DocumentId) -> Result<Option<DocumentRecord>> {
        Ok(self.records.read().iter().find(|r| &r.id == id).cloned())
    }

    async fn find_by_stored_name(&self, stored_file_name: &str) -> Result<Option<DocumentRecord>> {
        Ok(self
            .records
            .read()
            .iter()
            .find(|r| r.stored_file_name == stored_file_name)
            .cloned())
    }

    async fn set_code_data(&self, id: &DocumentId, code_data: &str) -> Result<()> {
        let mut records = self.records.write();
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| DocqrError::NotFound(format!("document {id}")))?;
        record.code_data = Some(code_data.to_string());
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().len() as u64)
    }
}
