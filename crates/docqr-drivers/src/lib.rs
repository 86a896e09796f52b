//! DocQR Drivers - Database driver implementations
//!
//! This crate gathers the concrete drivers behind feature flags and picks
//! one for a connection string by its scheme.

#[cfg(feature = "memory")]
pub use docqr_driver_memory as memory;
#[cfg(feature = "mongodb")]
pub use docqr_driver_mongodb as mongodb;

mod registry;

pub use registry::DriverRegistry;

/// Re-export commonly used types from docqr-core
pub use docqr_core::{Connection, DatabaseDriver, DocqrError, Result};
