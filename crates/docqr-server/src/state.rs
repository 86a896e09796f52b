use axum::{extract::FromRequestParts, http::request::Parts};
use docqr_connection::ConnectionManager;
use docqr_core::Connection;
use docqr_services::{CodeGenerator, FileStorage, UploadService};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::AppError;

/// Shared state of the HTTP handlers.
pub struct AppState {
    pub manager: Arc<ConnectionManager>,
    pub storage: FileStorage,
    pub uploads: UploadService,
    pub codes: CodeGenerator,
    /// Fixed base URL for codes; derived from the request when `None`
    pub public_url: Option<String>,
}

impl AppState {
    pub fn new(manager: Arc<ConnectionManager>, config: &ServerConfig) -> Arc<Self> {
        let storage = FileStorage::new(config.upload_dir.clone());
        let codes = CodeGenerator::new();
        let uploads = UploadService::new(storage.clone())
            .with_max_bytes(config.max_upload_bytes)
            .with_code_generator(codes.clone());

        Arc::new(Self {
            manager,
            storage,
            uploads,
            codes,
            public_url: config.public_url.clone(),
        })
    }

    /// Current connection, or `DatabaseUnavailable` when not live
    pub async fn connection(&self) -> Result<Arc<dyn Connection>, AppError> {
        self.manager
            .connection()
            .await
            .ok_or(AppError::DatabaseUnavailable)
    }
}

/// Base URL encoded into download codes.
///
/// The configured public URL when there is one, otherwise built from the
/// request's `Host` and `X-Forwarded-Proto` headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(pub String);

impl FromRequestParts<Arc<AppState>> for BaseUrl {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(url) = &state.public_url {
            return Ok(BaseUrl(url.clone()));
        }

        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let scheme = header("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
        let host = header("host").unwrap_or_else(|| "localhost".to_string());
        Ok(BaseUrl(format!("{scheme}://{host}")))
    }
}
