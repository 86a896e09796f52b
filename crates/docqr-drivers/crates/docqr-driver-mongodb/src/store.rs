//! Document metadata persisted in the `pdfs` collection

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use docqr_core::{DocqrError, DocumentId, DocumentRecord, DocumentStore, NewDocument, Result};
use futures::TryStreamExt;
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};
use serde::{Deserialize, Serialize};

use crate::errors::{classify, is_duplicate_key};

/// Collection holding one document per uploaded file
pub const DOCUMENTS_COLLECTION: &str = "pdfs";

/// Stored shape of a document record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub file_name: String,
    pub original_name: String,
    pub upload_date: bson::DateTime,
    #[serde(default)]
    pub qr_code_data: Option<String>,
}

impl PdfDocument {
    /// Build the stored form of a new record with a freshly generated id
    pub fn from_new(document: &NewDocument) -> Self {
        Self {
            id: Some(ObjectId::new()),
            file_name: document.stored_file_name.clone(),
            original_name: document.original_file_name.clone(),
            upload_date: bson::DateTime::from_millis(document.uploaded_at.timestamp_millis()),
            qr_code_data: document.code_data.clone(),
        }
    }

    pub fn into_record(self) -> Result<DocumentRecord> {
        let id = self.id.ok_or_else(|| {
            DocqrError::Driver(format!("document '{}' has no _id", self.file_name))
        })?;

        let uploaded_at = DateTime::<Utc>::from_timestamp_millis(self.upload_date.timestamp_millis())
            .ok_or_else(|| {
                DocqrError::Driver(format!(
                    "document '{}' has an out-of-range upload date",
                    self.file_name
                ))
            })?;

        Ok(DocumentRecord {
            id: DocumentId::new(id.to_hex()),
            stored_file_name: self.file_name,
            original_file_name: self.original_name,
            uploaded_at,
            code_data: self.qr_code_data,
        })
    }
}

/// [`DocumentStore`] backed by a MongoDB collection.
#[derive(Clone)]
pub struct MongoDocumentStore {
    collection: Collection<PdfDocument>,
}

impl MongoDocumentStore {
    pub fn new(collection: Collection<PdfDocument>) -> Self {
        Self { collection }
    }

    /// Create the unique index on the stored file name if it is missing.
    #[tracing::instrument(skip(self), fields(collection = DOCUMENTS_COLLECTION))]
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "fileName": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(|e| classify(&e, "failed to create fileName index"))?;

        tracing::debug!("unique fileName index ensured");
        Ok(())
    }
}

/// Parse a record id; anything that is not an ObjectId cannot exist.
fn object_id(id: &DocumentId) -> Option<ObjectId> {
    ObjectId::parse_str(id.as_str()).ok()
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    #[tracing::instrument(skip(self, document), fields(stored_file_name = %document.stored_file_name))]
    async fn insert(&self, document: NewDocument) -> Result<DocumentRecord> {
        let stored = PdfDocument::from_new(&document);

        self.collection.insert_one(&stored).await.map_err(|e| {
            if is_duplicate_key(&e) {
                DocqrError::RecordConflict(document.stored_file_name.clone())
            } else {
                classify(&e, "failed to insert document")
            }
        })?;

        tracing::debug!("document inserted");
        stored.into_record()
    }

    async fn list(&self) -> Result<Vec<DocumentRecord>> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "uploadDate": -1 })
            .await
            .map_err(|e| classify(&e, "failed to list documents"))?;

        let documents: Vec<PdfDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| classify(&e, "failed to read documents"))?;

        documents.into_iter().map(PdfDocument::into_record).collect()
    }

    async fn get(&self, id: &DocumentId) -> Result<Option<DocumentRecord>> {
        let Some(oid) = object_id(id) else {
            return Ok(None);
        };

        self.collection
            .find_one(doc! { "_id": oid })
            .await
            .map_err(|e| classify(&e, "failed to load document"))?
            .map(PdfDocument::into_record)
            .transpose()
    }

    async fn find_by_stored_name(&self, stored_file_name: &str) -> Result<Option<DocumentRecord>> {
        self.collection
            .find_one(doc! { "fileName": stored_file_name })
            .await
            .map_err(|e| classify(&e, "failed to load document"))?
            .map(PdfDocument::into_record)
            .transpose()
    }

    async fn set_code_data(&self, id: &DocumentId, code_data: &str) -> Result<()> {
        let oid = object_id(id).ok_or_else(|| DocqrError::NotFound(format!("document {id}")))?;

        let result = self
            .collection
            .update_one(doc! { "_id": oid }, doc! { "$set": { "qrCodeData": code_data } })
            .await
            .map_err(|e| classify(&e, "failed to store code"))?;

        if result.matched_count == 0 {
            return Err(DocqrError::NotFound(format!("document {id}")));
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        self.collection
            .count_documents(doc! {})
            .await
            .map_err(|e| classify(&e, "failed to count documents"))
    }
}
