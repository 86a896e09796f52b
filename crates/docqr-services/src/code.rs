//! Scannable download codes
//!
//! Each document gets a QR code encoding its absolute download URL. The
//! code is rendered to PNG and kept on the record as a `data:` URL so the
//! gallery can inline it.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use docqr_core::{DocumentId, DocumentRecord, DocumentStore};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;

use crate::error::{ServiceError, ServiceResult};

/// Prefix of every rendered code
pub const CODE_DATA_PREFIX: &str = "data:image/png;base64,";

/// Smallest edge of the rendered image, in pixels
pub const DEFAULT_MIN_SIZE: u32 = 200;

/// Absolute download URL for a document
pub fn download_url(base_url: &str, id: &DocumentId) -> String {
    format!("{}/api/pdf/download/{}", base_url.trim_end_matches('/'), id)
}

/// Renders download codes and caches them on document records.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    min_size: u32,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
        }
    }

    pub fn with_min_size(mut self, min_size: u32) -> Self {
        self.min_size = min_size;
        self
    }

    /// Render `content` as a PNG QR code `data:` URL
    pub fn render_data_url(&self, content: &str) -> ServiceResult<String> {
        let code = QrCode::new(content.as_bytes())
            .map_err(|e| ServiceError::CodeGeneration(e.to_string()))?;

        let pixels = code
            .render::<Luma<u8>>()
            .min_dimensions(self.min_size, self.min_size)
            .build();

        let mut png = Vec::new();
        DynamicImage::ImageLuma8(pixels)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ServiceError::CodeGeneration(e.to_string()))?;

        Ok(format!("{CODE_DATA_PREFIX}{}", BASE64_STANDARD.encode(&png)))
    }

    /// Render the code for a record without storing it
    pub fn render_for(&self, record: &DocumentRecord, base_url: &str) -> ServiceResult<String> {
        self.render_data_url(&download_url(base_url, &record.id))
    }

    /// Return the cached code of `record`, rendering and caching it first
    /// when the record has none.
    #[tracing::instrument(skip(self, store, record), fields(id = %record.id))]
    pub async fn ensure_code(
        &self,
        store: &dyn DocumentStore,
        record: &DocumentRecord,
        base_url: &str,
    ) -> ServiceResult<String> {
        if let Some(code) = record.code_data.as_deref().filter(|c| !c.is_empty()) {
            return Ok(code.to_string());
        }

        let code = self.render_for(record, base_url)?;
        store.set_code_data(&record.id, &code).await?;
        tracing::debug!("code generated and cached");
        Ok(code)
    }

    /// Code for the document with `id`; `NotFound` if there is none
    pub async fn code_for(
        &self,
        store: &dyn DocumentStore,
        id: &DocumentId,
        base_url: &str,
    ) -> ServiceResult<String> {
        let record = store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("document {id}")))?;
        self.ensure_code(store, &record, base_url).await
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
