//! Common test utilities and mocks

#![allow(dead_code)]

use async_trait::async_trait;
use docqr_core::{
    Connection, ConnectionEvent, DatabaseDriver, DocqrError, DocumentId, DocumentRecord,
    DocumentStore, EVENT_CHANNEL_CAPACITY, NewDocument, Result,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::broadcast;

/// How a mock driver responds to a connect attempt
#[derive(Debug, Clone)]
pub enum ConnectBehavior {
    Succeed,
    Fail(fn() -> DocqrError),
    Hang,
}

/// Mock driver that fails a configurable number of attempts before
/// following its final behavior.
pub struct MockDriver {
    pub failures_before_success: u32,
    pub behavior: ConnectBehavior,
    pub calls: AtomicU32,
    pub connections: parking_lot::Mutex<Vec<Arc<MockConnection>>>,
}

impl MockDriver {
    pub fn succeeding() -> Self {
        Self {
            failures_before_success: 0,
            behavior: ConnectBehavior::Succeed,
            calls: AtomicU32::new(0),
            connections: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing() -> Self {
        Self {
            behavior: ConnectBehavior::Fail(|| DocqrError::Network("connection refused".into())),
            ..Self::succeeding()
        }
    }

    pub fn hanging() -> Self {
        Self {
            behavior: ConnectBehavior::Hang,
            ..Self::succeeding()
        }
    }

    pub fn failing_first(failures: u32) -> Self {
        Self {
            failures_before_success: failures,
            ..Self::succeeding()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recently created connection
    pub fn last_connection(&self) -> Arc<MockConnection> {
        self.connections
            .lock()
            .last()
            .cloned()
            .expect("no connection created yet")
    }
}

#[async_trait]
impl DatabaseDriver for MockDriver {
    fn id(&self) -> &'static str {
        "mock"
    }

    fn display_name(&self) -> &'static str {
        "Mock"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["mongodb", "mongodb+srv"]
    }

    async fn connect(&self, _uri: &str) -> Result<Arc<dyn Connection>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if call <= self.failures_before_success {
            return Err(DocqrError::ServerSelection(format!(
                "server selection timed out (attempt {call})"
            )));
        }

        match &self.behavior {
            ConnectBehavior::Succeed => {
                let connection = Arc::new(MockConnection::new());
                self.connections.lock().push(Arc::clone(&connection));
                Ok(connection)
            }
            ConnectBehavior::Fail(make_error) => Err(make_error()),
            ConnectBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// Mock connection whose events are sent by the test
pub struct MockConnection {
    events: broadcast::Sender<ConnectionEvent>,
    closed: AtomicBool,
    store: EmptyStore,
}

impl MockConnection {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            events,
            closed: AtomicBool::new(false),
            store: EmptyStore,
        }
    }

    pub fn emit(&self, event: ConnectionEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    fn database_name(&self) -> &str {
        "pdfLibrary"
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    fn documents(&self) -> &dyn DocumentStore {
        &self.store
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.emit(ConnectionEvent::Disconnected);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Store with no records that refuses writes
pub struct EmptyStore;

#[async_trait]
impl DocumentStore for EmptyStore {
    async fn insert(&self, _document: NewDocument) -> Result<DocumentRecord> {
        Err(DocqrError::Other("read-only mock store".into()))
    }

    async fn list(&self) -> Result<Vec<DocumentRecord>> {
        Ok(Vec::new())
    }

    async fn get(&self, _id: &DocumentId) -> Result<Option<DocumentRecord>> {
        Ok(None)
    }

    async fn find_by_stored_name(&self, _stored_file_name: &str) -> Result<Option<DocumentRecord>> {
        Ok(None)
    }

    async fn set_code_data(&self, id: &DocumentId, _code_data: &str) -> Result<()> {
        Err(DocqrError::NotFound(id.to_string()))
    }

    async fn count(&self) -> Result<u64> {
        Ok(0)
    }
}
