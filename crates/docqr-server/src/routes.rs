//! HTTP handlers

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use docqr_core::{DocumentId, DocumentRecord};
use docqr_services::{PDF_CONTENT_TYPE, ServiceError, UploadRequest, download_url};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::AppError;
use crate::render::{self, GalleryItem};
use crate::state::{AppState, BaseUrl};

/// Multipart field carrying the uploaded file
pub const UPLOAD_FIELD: &str = "pdf";

pub const LIST_PATH: &str = "/api/pdf/list";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub id: String,
    pub file_name: String,
    pub stored_file_name: String,
    pub upload_date: DateTime<Utc>,
    pub download_url: String,
    pub qr_code_data: Option<String>,
}

impl UploadedDocument {
    fn new(record: DocumentRecord, base_url: &str) -> Self {
        Self {
            download_url: download_url(base_url, &record.id),
            id: record.id.to_string(),
            file_name: record.original_file_name,
            stored_file_name: record.stored_file_name,
            upload_date: record.uploaded_at,
            qr_code_data: record.code_data,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeResponse {
    pub success: bool,
    pub qr_code_data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCode {
    pub id: String,
    pub qr_code: String,
    pub download_url: String,
}

pub async fn index() -> Redirect {
    Redirect::to(LIST_PATH)
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = state.manager.state();
    let (status, label) = if state.manager.is_live() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(json!({ "status": label, "database": database.as_str() })),
    )
}

/// Gallery of all documents, newest first. Missing codes are generated and
/// cached on the way.
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    BaseUrl(base_url): BaseUrl,
) -> Result<Html<String>, AppError> {
    let connection = state.connection().await?;
    let store = connection.documents();
    let records = store.list().await?;

    let mut codes = Vec::with_capacity(records.len());
    for record in &records {
        match state.codes.ensure_code(store, record, &base_url).await {
            Ok(code) => codes.push(Some(code)),
            Err(e) => {
                tracing::warn!(id = %record.id, error = %e, "could not generate code");
                codes.push(None);
            }
        }
    }

    let items: Vec<GalleryItem<'_>> = records
        .iter()
        .zip(&codes)
        .map(|(record, code)| GalleryItem {
            record,
            code: code.as_deref(),
        })
        .collect();

    tracing::debug!(documents = items.len(), "rendering gallery");
    Ok(Html(render::gallery_page(&items)))
}

pub async fn upload_form(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render::upload_page(state.uploads.max_bytes()))
}

/// Accept a multipart upload. Browsers are redirected to the gallery; JSON
/// clients get the new record.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    BaseUrl(base_url): BaseUrl,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let request = read_upload(&mut multipart, state.uploads.max_bytes()).await?;
    let connection = state.connection().await?;
    let record = state
        .uploads
        .upload(connection.documents(), request, &base_url)
        .await?;

    if wants_json(&headers) {
        let body = UploadedDocument::new(record, &base_url);
        Ok((StatusCode::CREATED, Json(body)).into_response())
    } else {
        Ok(Redirect::to(LIST_PATH).into_response())
    }
}

pub async fn download_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let connection = state.connection().await?;
    let record = connection
        .documents()
        .get(&DocumentId::new(id.as_str()))
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("document {id}")))?;

    let bytes = state.storage.read(&record.stored_file_name).await?;
    tracing::debug!(%id, size = bytes.len(), "serving document");

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static(PDF_CONTENT_TYPE)),
            (
                CONTENT_DISPOSITION,
                content_disposition(&record.original_file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

pub async fn document_code(
    State(state): State<Arc<AppState>>,
    BaseUrl(base_url): BaseUrl,
    Path(id): Path<String>,
) -> Result<Json<CodeResponse>, AppError> {
    let connection = state.connection().await?;
    let code = state
        .codes
        .code_for(connection.documents(), &DocumentId::new(id), &base_url)
        .await?;

    Ok(Json(CodeResponse {
        success: true,
        qr_code_data: code,
    }))
}

/// Codes for every document
pub async fn all_codes(
    State(state): State<Arc<AppState>>,
    BaseUrl(base_url): BaseUrl,
) -> Result<Json<Vec<DocumentCode>>, AppError> {
    let connection = state.connection().await?;
    let store = connection.documents();

    let mut codes = Vec::new();
    for record in store.list().await? {
        let code = state.codes.ensure_code(store, &record, &base_url).await?;
        codes.push(DocumentCode {
            download_url: download_url(&base_url, &record.id),
            id: record.id.to_string(),
            qr_code: code,
        });
    }

    Ok(Json(codes))
}

async fn read_upload(multipart: &mut Multipart, limit: usize) -> Result<UploadRequest, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        return Ok(UploadRequest::new(file_name, content_type, bytes));
    }

    Err(ServiceError::InvalidUpload(format!("no file in field '{UPLOAD_FIELD}'")).into())
}

fn multipart_error(error: MultipartError, limit: usize) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServiceError::PayloadTooLarge { limit }.into()
    } else {
        AppError::BadRequest(error.body_text())
    }
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

/// `attachment` disposition with an ASCII-only file name
fn content_disposition(file_name: &str) -> HeaderValue {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_replaces_unsafe_characters() {
        assert_eq!(
            content_disposition("Report \"final\" ü.pdf"),
            "attachment; filename=\"Report _final_ _.pdf\""
        );
    }

    #[test]
    fn test_wants_json() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        assert!(wants_json(&headers));
    }
}
