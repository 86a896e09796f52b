//! Driver registry for selecting a driver by connection string

use docqr_core::{DatabaseDriver, DocqrError, Result, sanitize_uri, uri::scheme_of};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available database drivers
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "mongodb")]
        registry.register(Arc::new(crate::mongodb::MongoDbDriver::new()));
        #[cfg(feature = "memory")]
        registry.register(Arc::new(crate::memory::MemoryDriver::new()));

        registry
    }

    /// Register a new driver, replacing any driver with the same id
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let id = driver.id().to_string();
        tracing::debug!(driver = %id, schemes = ?driver.schemes(), "registering database driver");
        self.drivers.insert(id, driver);
    }

    /// Get a driver by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(id).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %id, "driver not found in registry");
        }
        driver
    }

    /// Pick the driver that accepts the scheme of `uri`
    pub fn for_uri(&self, uri: &str) -> Result<Arc<dyn DatabaseDriver>> {
        let scheme = scheme_of(uri).ok_or_else(|| {
            DocqrError::UriParse(format!("{}: missing scheme", sanitize_uri(uri)))
        })?;

        self.drivers
            .values()
            .find(|driver| driver.accepts(uri))
            .cloned()
            .ok_or_else(|| {
                DocqrError::Driver(format!("no driver registered for scheme '{scheme}'"))
            })
    }

    /// List all registered driver ids, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Check if a driver is registered
    pub fn has(&self, id: &str) -> bool {
        self.drivers.contains_key(id)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
