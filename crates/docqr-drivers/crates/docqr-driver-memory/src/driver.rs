//! In-memory driver implementation

use async_trait::async_trait;
use docqr_core::{
    Connection, ConnectionTarget, DatabaseDriver, DocqrError, FailureKind, Result, sanitize_uri,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::connection::MemoryConnection;
use crate::store::MemoryDocumentStore;

/// Connect failures queued by a test
#[derive(Debug, Clone, Copy)]
struct InjectedFailures {
    remaining: u32,
    kind: FailureKind,
}

/// In-process database driver
pub struct MemoryDriver {
    databases: Mutex<HashMap<String, Arc<MemoryDocumentStore>>>,
    failures: Mutex<Option<InjectedFailures>>,
    last_connection: Mutex<Option<Arc<MemoryConnection>>>,
    connect_calls: AtomicU32,
}

impl MemoryDriver {
    /// Create a new in-memory driver instance
    pub fn new() -> Self {
        Self {
            databases: Mutex::new(HashMap::new()),
            failures: Mutex::new(None),
            last_connection: Mutex::new(None),
            connect_calls: AtomicU32::new(0),
        }
    }

    /// Make the next `count` connect attempts fail with an error of `kind`
    pub fn fail_next_connects(&self, count: u32, kind: FailureKind) {
        *self.failures.lock() = (count > 0).then_some(InjectedFailures {
            remaining: count,
            kind,
        });
    }

    /// Number of connect attempts seen so far
    pub fn connect_calls(&self) -> u32 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// The most recently opened connection, for injecting events
    pub fn last_connection(&self) -> Option<Arc<MemoryConnection>> {
        self.last_connection.lock().clone()
    }

    /// Shared store for a database name, created on first use
    pub fn store(&self, database_name: &str) -> Arc<MemoryDocumentStore> {
        Arc::clone(
            self.databases
                .lock()
                .entry(database_name.to_string())
                .or_default(),
        )
    }

    fn take_injected_failure(&self) -> Option<DocqrError> {
        let mut failures = self.failures.lock();
        let injected = failures.as_mut()?;
        injected.remaining -= 1;
        let kind = injected.kind;
        if injected.remaining == 0 {
            *failures = None;
        }

        Some(match kind {
            FailureKind::Network => DocqrError::Network("injected connection refusal".into()),
            FailureKind::ServerSelection => {
                DocqrError::ServerSelection("injected server selection timeout".into())
            }
            FailureKind::Other => DocqrError::Connection("injected connect failure".into()),
        })
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for MemoryDriver {
    fn id(&self) -> &'static str {
        "memory"
    }

    fn display_name(&self) -> &'static str {
        "In-memory"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["memory"]
    }

    #[tracing::instrument(skip(self, uri), fields(uri = %sanitize_uri(uri)))]
    async fn connect(&self, uri: &str) -> Result<Arc<dyn Connection>> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.take_injected_failure() {
            tracing::debug!(error = %error, "failing connect attempt on request");
            return Err(error);
        }

        let target = ConnectionTarget::parse(uri)?;
        let connection = Arc::new(MemoryConnection::new(
            target.host.clone(),
            self.store(&target.host),
        ));
        *self.last_connection.lock() = Some(Arc::clone(&connection));

        tracing::debug!(database = %target.host, "connected to in-memory database");
        Ok(connection)
    }
}
