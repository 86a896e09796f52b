//! Shared fixtures for service tests

#![allow(dead_code)]

use async_trait::async_trait;
use docqr_core::{
    DocqrError, DocumentId, DocumentRecord, DocumentStore, NewDocument, Result,
};
use docqr_driver_memory::MemoryDocumentStore;
use docqr_services::FileStorage;
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

pub const BASE_URL: &str = "http://localhost:3000";

/// Smallest byte sequence that passes the PDF checks
pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n"
        .to_vec()
}

/// Storage rooted in a fresh temporary directory
pub fn temp_storage() -> (TempDir, FileStorage) {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("pdfs"));
    (dir, storage)
}

/// Store whose inserts always fail
#[derive(Default)]
pub struct RejectingStore {
    pub inserts: AtomicU32,
}

#[async_trait]
impl DocumentStore for RejectingStore {
    async fn insert(&self, document: NewDocument) -> Result<DocumentRecord> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Err(DocqrError::RecordConflict(document.stored_file_name))
    }

    async fn list(&self) -> Result<Vec<DocumentRecord>> {
        Ok(Vec::new())
    }

    async fn get(&self, _id: &DocumentId) -> Result<Option<DocumentRecord>> {
        Ok(None)
    }

    async fn find_by_stored_name(&self, _stored_file_name: &str) -> Result<Option<DocumentRecord>> {
        Ok(None)
    }

    async fn set_code_data(&self, id: &DocumentId, _code_data: &str) -> Result<()> {
        Err(DocqrError::NotFound(format!("document {id}")))
    }

    async fn count(&self) -> Result<u64> {
        Ok(0)
    }
}

pub fn memory_store() -> MemoryDocumentStore {
    MemoryDocumentStore::new()
}
