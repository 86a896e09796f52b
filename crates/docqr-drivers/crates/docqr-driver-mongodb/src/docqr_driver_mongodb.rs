//! MongoDB driver for the DocQR document service
//!
//! Connects with the official `mongodb` crate, verifies the deployment with
//! a `ping` command and keeps document metadata in the `pdfs` collection.
//!
//! # Features
//!
//! - One connect attempt per call; retrying is left to the caller
//! - Server heartbeat and topology events forwarded as connection events
//! - Driver errors classified as network, server-selection or other
//! - Unique index on the stored file name
//!
//! # Example
//!
//! ```ignore
//! use docqr_driver_mongodb::MongoDbDriver;
//! use docqr_core::DatabaseDriver;
//!
//! let driver = MongoDbDriver::new();
//! let conn = driver.connect("mongodb://localhost:27017/pdfLibrary").await?;
//! let count = conn.documents().count().await?;
//! ```

mod connection;
mod driver;
#[cfg(test)]
mod driver_tests;
mod errors;
mod events;
#[cfg(test)]
mod events_tests;
mod store;
#[cfg(test)]
mod store_tests;

pub use connection::MongoDbConnection;
pub use driver::*;
pub use store::{DOCUMENTS_COLLECTION, MongoDocumentStore, PdfDocument};
