//! DocQR Services - Application logic between the HTTP layer and storage
//!
//! - [`UploadService`]: validates and stores uploaded PDFs
//! - [`CodeGenerator`]: renders and caches download codes
//! - [`ImportService`]: registers files already in the upload directory
//! - [`FileStorage`]: the upload directory on disk

mod code;
mod error;
mod import;
mod storage;
mod upload;

pub use code::{CODE_DATA_PREFIX, CodeGenerator, DEFAULT_MIN_SIZE, download_url};
pub use error::{ServiceError, ServiceResult};
pub use import::{ImportService, ImportSummary};
pub use storage::{FileStorage, sanitize_file_name, stored_file_name};
pub use upload::{
    DEFAULT_MAX_UPLOAD_BYTES, PDF_CONTENT_TYPE, PDF_MAGIC, UploadRequest, UploadService,
};
