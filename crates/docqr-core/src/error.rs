//! Error types for docqr

use thiserror::Error;

/// Core error type for docqr operations
#[derive(Error, Debug)]
pub enum DocqrError {
    /// Every attempt of a connect sequence failed. Carries the last failure.
    #[error("Connection failed after {attempts} attempt(s): {source}")]
    ConnectionExhausted {
        attempts: u32,
        #[source]
        source: Box<DocqrError>,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server selection error: {0}")]
    ServerSelection(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid connection string: {0}")]
    UriParse(String),

    #[error("Record conflict: a document stored as '{0}' already exists")]
    RecordConflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl DocqrError {
    /// Whether the error came out of the connection layer rather than a query.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DocqrError::ConnectionExhausted { .. }
                | DocqrError::Connection(_)
                | DocqrError::Network(_)
                | DocqrError::ServerSelection(_)
                | DocqrError::Timeout(_)
        )
    }
}

/// Result type alias for docqr operations
pub type Result<T> = std::result::Result<T, DocqrError>;
