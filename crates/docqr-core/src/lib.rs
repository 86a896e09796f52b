//! DocQR Core - Core abstractions shared by the document hosting service
//!
//! This crate provides the traits and types that all other docqr crates
//! depend on. It defines:
//!
//! - `DatabaseDriver` - Trait for database driver implementations
//! - `Connection` - Trait for a live database connection and its event stream
//! - `DocumentStore` - Trait for persisting uploaded document metadata
//! - Connection string helpers in [`uri`]

mod connection;
mod document;
mod driver;
mod error;
pub mod uri;

pub use connection::*;
pub use document::*;
pub use driver::*;
pub use error::*;
pub use uri::{CREDENTIAL_MASK, ConnectionTarget, DEFAULT_MONGODB_PORT, is_srv_uri, sanitize_uri};
