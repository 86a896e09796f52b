//! In-process driver for the DocQR document service
//!
//! Keeps document records in memory, keyed by the host part of a
//! `memory://name` connection string. Records survive reconnects to the
//! same name for the lifetime of the driver. Connect failures and
//! connection events can be injected, which makes this driver the
//! backbone of the service tests.
//!
//! # Example
//!
//! ```ignore
//! use docqr_driver_memory::MemoryDriver;
//! use docqr_core::DatabaseDriver;
//!
//! let driver = MemoryDriver::new();
//! let conn = driver.connect("memory://local").await?;
//! ```

mod connection;
mod driver;
#[cfg(test)]
mod driver_tests;
mod store;
#[cfg(test)]
mod store_tests;

pub use connection::MemoryConnection;
pub use driver::*;
pub use store::MemoryDocumentStore;
