//! Database driver trait definition

use crate::{Connection, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// A database driver: knows how to turn a connection string into a live connection.
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Get the driver identifier (e.g., "mongodb")
    fn id(&self) -> &'static str;

    /// Get the display name (e.g., "MongoDB")
    fn display_name(&self) -> &'static str;

    /// URI schemes this driver accepts (e.g., `["mongodb", "mongodb+srv"]`)
    fn schemes(&self) -> &'static [&'static str];

    /// Get the default port for this database
    fn default_port(&self) -> Option<u16> {
        None
    }

    /// Perform a single connection attempt.
    ///
    /// Resolves once the driver has either verified the server is usable or
    /// failed. Retrying is the caller's concern.
    async fn connect(&self, uri: &str) -> Result<Arc<dyn Connection>>;

    /// Check whether this driver accepts the given connection string
    fn accepts(&self, uri: &str) -> bool {
        crate::uri::scheme_of(uri)
            .map(|scheme| self.schemes().iter().any(|s| s.eq_ignore_ascii_case(scheme)))
            .unwrap_or(false)
    }
}
