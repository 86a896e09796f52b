//! Validating and storing uploaded PDFs

use bytes::Bytes;
use chrono::Utc;
use docqr_core::{DocumentRecord, DocumentStore, NewDocument};

use crate::code::CodeGenerator;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::{FileStorage, stored_file_name};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Every PDF file starts with these bytes
pub const PDF_MAGIC: &[u8] = b"%PDF-";

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// One file received from a client.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadRequest {
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes: bytes.into(),
        }
    }
}

/// Service for accepting uploads
///
/// Writes the file to storage, records it in the document store and
/// caches its download code.
#[derive(Debug, Clone)]
pub struct UploadService {
    storage: FileStorage,
    codes: CodeGenerator,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(storage: FileStorage) -> Self {
        Self {
            storage,
            codes: CodeGenerator::new(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_code_generator(mut self, codes: CodeGenerator) -> Self {
        self.codes = codes;
        self
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    /// Check an upload without touching storage
    pub fn validate(&self, request: &UploadRequest) -> ServiceResult<()> {
        if request.file_name.trim().is_empty() {
            return Err(ServiceError::InvalidUpload("missing file name".into()));
        }

        let is_pdf = request
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|ct| ct.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE));
        if !is_pdf {
            return Err(ServiceError::InvalidUpload(
                "only PDF files are accepted".into(),
            ));
        }

        if request.bytes.len() > self.max_bytes {
            return Err(ServiceError::PayloadTooLarge {
                limit: self.max_bytes,
            });
        }
        if request.bytes.is_empty() {
            return Err(ServiceError::InvalidUpload("file is empty".into()));
        }
        if !request.bytes.starts_with(PDF_MAGIC) {
            return Err(ServiceError::InvalidUpload(
                "file is not a PDF document".into(),
            ));
        }
        Ok(())
    }

    /// Store an upload and return its record.
    ///
    /// The file is removed again if the record cannot be inserted. A failure
    /// to render the code is only logged: the gallery renders it lazily.
    #[tracing::instrument(skip(self, store, request), fields(file = %request.file_name, size = request.bytes.len()))]
    pub async fn upload(
        &self,
        store: &dyn DocumentStore,
        request: UploadRequest,
        base_url: &str,
    ) -> ServiceResult<DocumentRecord> {
        self.validate(&request)?;

        let uploaded_at = Utc::now();
        let stored_name = stored_file_name(&request.file_name, uploaded_at);
        self.storage.write_new(&stored_name, &request.bytes).await?;

        let new = NewDocument::new(stored_name.clone(), request.file_name.trim())
            .with_uploaded_at(uploaded_at);
        let mut record = match store.insert(new).await {
            Ok(record) => record,
            Err(e) => {
                if let Err(cleanup) = self.storage.remove(&stored_name).await {
                    tracing::warn!(error = %cleanup, "could not remove orphaned upload");
                }
                return Err(e.into());
            }
        };

        match self.codes.ensure_code(store, &record, base_url).await {
            Ok(code) => record.code_data = Some(code),
            Err(e) => tracing::warn!(id = %record.id, error = %e, "code generation deferred"),
        }

        tracing::info!(id = %record.id, stored = %record.stored_file_name, "document uploaded");
        Ok(record)
    }
}
