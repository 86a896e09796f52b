//! HTTP error responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docqr_core::DocqrError;
use docqr_services::ServiceError;
use serde_json::json;
use thiserror::Error;

pub const UNAVAILABLE_MESSAGE: &str =
    "The server is temporarily unable to connect to the database. Please try again later.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database connection unavailable")]
    DatabaseUnavailable,

    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Service(error) => match error {
                ServiceError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
                ServiceError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                ServiceError::RecordConflict(_) => StatusCode::CONFLICT,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Database(e) if e.is_connection_error() => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                ServiceError::Storage(_)
                | ServiceError::CodeGeneration(_)
                | ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<DocqrError> for AppError {
    fn from(error: DocqrError) -> Self {
        AppError::Service(error.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error, message) = match status {
            StatusCode::SERVICE_UNAVAILABLE => {
                tracing::warn!(error = %self, "request failed: database unavailable");
                (
                    "Database connection unavailable".to_string(),
                    UNAVAILABLE_MESSAGE.to_string(),
                )
            }
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %self, "request failed");
                (
                    "Internal server error".to_string(),
                    "The request could not be completed.".to_string(),
                )
            }
            _ => {
                tracing::debug!(error = %self, %status, "request rejected");
                (
                    status.canonical_reason().unwrap_or("Error").to_string(),
                    self.to_string(),
                )
            }
        };

        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}
