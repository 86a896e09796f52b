use docqr_core::DocqrError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level errors with user-friendly messages
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Upload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("A document stored as '{0}' already exists")]
    RecordConflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Code generation failed: {0}")]
    CodeGeneration(String),

    #[error("Database error: {0}")]
    Database(#[source] DocqrError),
}

impl From<DocqrError> for ServiceError {
    fn from(error: DocqrError) -> Self {
        match error {
            DocqrError::RecordConflict(name) => ServiceError::RecordConflict(name),
            DocqrError::NotFound(what) => ServiceError::NotFound(what),
            other => ServiceError::Database(other),
        }
    }
}
