//! MongoDB connection implementation

use async_trait::async_trait;
use docqr_core::{Connection, ConnectionEvent, DocumentStore, Result};
use mongodb::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

use crate::store::MongoDocumentStore;

/// A verified MongoDB client bound to one database.
pub struct MongoDbConnection {
    client: Client,
    database_name: String,
    store: MongoDocumentStore,
    events: broadcast::Sender<ConnectionEvent>,
    closed: AtomicBool,
}

impl MongoDbConnection {
    pub(crate) fn new(
        client: Client,
        database_name: String,
        store: MongoDocumentStore,
        events: broadcast::Sender<ConnectionEvent>,
    ) -> Self {
        Self {
            client,
            database_name,
            store,
            events,
            closed: AtomicBool::new(false),
        }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Connection for MongoDbConnection {
    fn driver_name(&self) -> &str {
        "mongodb"
    }

    fn database_name(&self) -> &str {
        &self.database_name
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    fn documents(&self) -> &dyn DocumentStore {
        &self.store
    }

    #[tracing::instrument(skip(self), fields(database = %self.database_name))]
    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        tracing::debug!("shutting down MongoDB client");
        self.client.clone().shutdown().await;
        let _ = self.events.send(ConnectionEvent::Disconnected);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
