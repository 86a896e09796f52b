//! In-memory connection implementation

use async_trait::async_trait;
use docqr_core::{Connection, ConnectionEvent, DocumentStore, EVENT_CHANNEL_CAPACITY, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

use crate::store::MemoryDocumentStore;

/// Connection to a named in-memory database.
pub struct MemoryConnection {
    database_name: String,
    store: Arc<MemoryDocumentStore>,
    events: broadcast::Sender<ConnectionEvent>,
    closed: AtomicBool,
}

impl MemoryConnection {
    pub(crate) fn new(database_name: String, store: Arc<MemoryDocumentStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            database_name,
            store,
            events,
            closed: AtomicBool::new(false),
        }
    }

    /// Deliver a connection event to every subscriber, as a real driver
    /// would when the server goes away or comes back.
    pub fn emit(&self, event: ConnectionEvent) {
        tracing::debug!(?event, database = %self.database_name, "emitting connection event");
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    fn driver_name(&self) -> &str {
        "memory"
    }

    fn database_name(&self) -> &str {
        &self.database_name
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    fn documents(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.emit(ConnectionEvent::Disconnected);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
