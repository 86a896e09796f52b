//! Bulk import of PDFs already present in the upload directory

use docqr_core::{DocumentStore, NewDocument};

use crate::code::CodeGenerator;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::FileStorage;

/// Outcome of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: Vec<String>,
    /// Files that already had a record
    pub skipped: Vec<String>,
    /// File name and reason
    pub failed: Vec<(String, String)>,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.imported.len() + self.skipped.len() + self.failed.len()
    }
}

/// Registers every `.pdf` file in the storage directory that has no record.
#[derive(Debug, Clone)]
pub struct ImportService {
    storage: FileStorage,
    codes: CodeGenerator,
}

impl ImportService {
    pub fn new(storage: FileStorage) -> Self {
        Self {
            storage,
            codes: CodeGenerator::new(),
        }
    }

    /// Import the directory. A file that fails does not stop the others.
    #[tracing::instrument(skip(self, store), fields(dir = %self.storage.root().display()))]
    pub async fn import_directory(
        &self,
        store: &dyn DocumentStore,
        base_url: &str,
    ) -> ServiceResult<ImportSummary> {
        self.storage.ensure_root().await?;
        let names = self.storage.list_pdfs().await?;
        tracing::info!(files = names.len(), "scanning upload directory");

        let mut summary = ImportSummary::default();
        for name in names {
            match self.import_one(store, &name, base_url).await {
                Ok(true) => summary.imported.push(name),
                Ok(false) => summary.skipped.push(name),
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "import failed");
                    summary.failed.push((name, e.to_string()));
                }
            }
        }

        tracing::info!(
            imported = summary.imported.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "import finished"
        );
        Ok(summary)
    }

    /// `Ok(false)` when the file is already registered
    async fn import_one(
        &self,
        store: &dyn DocumentStore,
        name: &str,
        base_url: &str,
    ) -> ServiceResult<bool> {
        if store.find_by_stored_name(name).await?.is_some() {
            tracing::debug!(file = %name, "already registered");
            return Ok(false);
        }

        let record = match store.insert(NewDocument::new(name, name)).await {
            Ok(record) => record,
            Err(docqr_core::DocqrError::RecordConflict(_)) => return Ok(false),
            Err(e) => return Err(ServiceError::from(e)),
        };

        self.codes.ensure_code(store, &record, base_url).await?;
        tracing::debug!(file = %name, id = %record.id, "imported");
        Ok(true)
    }
}
