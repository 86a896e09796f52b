//! MongoDB driver implementation

use async_trait::async_trait;
use bson::doc;
use docqr_core::{
    Connection, DEFAULT_MONGODB_PORT, DatabaseDriver, EVENT_CHANNEL_CAPACITY, Result, sanitize_uri,
};
use mongodb::{Client, options::ClientOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::connection::MongoDbConnection;
use crate::errors::classify;
use crate::events;
use crate::store::{DOCUMENTS_COLLECTION, MongoDocumentStore};

/// Database used when the connection string does not name one
pub const DEFAULT_DATABASE: &str = "pdfLibrary";

/// How long the client waits for a usable server before giving up
pub const DEFAULT_SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(25);

/// Application name reported to the server
pub const APP_NAME: &str = "docqr";

/// MongoDB database driver
///
/// Accepts both `mongodb://` seed lists and `mongodb+srv://` hosted
/// cluster strings. Options present in the connection string take
/// precedence over the driver defaults.
pub struct MongoDbDriver {
    server_selection_timeout: Duration,
}

impl MongoDbDriver {
    /// Create a new MongoDB driver instance
    pub fn new() -> Self {
        tracing::debug!("MongoDB driver initialized");
        Self {
            server_selection_timeout: DEFAULT_SERVER_SELECTION_TIMEOUT,
        }
    }

    /// Override the server selection timeout used when the connection
    /// string does not set `serverSelectionTimeoutMS`
    pub fn with_server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = timeout;
        self
    }

    pub fn server_selection_timeout(&self) -> Duration {
        self.server_selection_timeout
    }

    /// Fill in defaults the connection string left unset
    pub(crate) fn apply_defaults(&self, options: &mut ClientOptions) -> String {
        if options.app_name.is_none() {
            options.app_name = Some(APP_NAME.to_string());
        }
        if options.server_selection_timeout.is_none() {
            options.server_selection_timeout = Some(self.server_selection_timeout);
        }
        options
            .default_database
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
    }
}

impl Default for MongoDbDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for MongoDbDriver {
    fn id(&self) -> &'static str {
        "mongodb"
    }

    fn display_name(&self) -> &'static str {
        "MongoDB"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["mongodb", "mongodb+srv"]
    }

    fn default_port(&self) -> Option<u16> {
        Some(DEFAULT_MONGODB_PORT)
    }

    #[tracing::instrument(skip(self, uri), fields(uri = %sanitize_uri(uri)))]
    async fn connect(&self, uri: &str) -> Result<Arc<dyn Connection>> {
        tracing::debug!("connecting to MongoDB");

        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| classify(&e, "failed to parse MongoDB options"))?;
        let database_name = self.apply_defaults(&mut options);

        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        options.sdam_event_handler = Some(events::handler(events_tx.clone()));

        let client = Client::with_options(options)
            .map_err(|e| classify(&e, "failed to create MongoDB client"))?;
        let database = client.database(&database_name);

        // The client connects lazily; ping forces server selection now.
        if let Err(e) = database.run_command(doc! { "ping": 1 }).await {
            client.shutdown().await;
            return Err(classify(&e, "failed to reach MongoDB"));
        }

        let store = MongoDocumentStore::new(database.collection(DOCUMENTS_COLLECTION));
        if let Err(e) = store.ensure_indexes().await {
            client.shutdown().await;
            return Err(e);
        }

        tracing::info!(database = %database_name, "connected to MongoDB");
        Ok(Arc::new(MongoDbConnection::new(
            client,
            database_name,
            store,
            events_tx,
        )))
    }
}
