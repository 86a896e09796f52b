//! Connection trait, connection state and asynchronous connection events

use crate::{DocqrError, DocumentStore, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

/// Capacity of the per-connection event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Lifecycle state of the single logical database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a failed connect attempt, for operator logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The host could not be reached (DNS, refused, reset, timed out).
    Network,
    /// The driver reached the network but could not select a usable server.
    ServerSelection,
    Other,
}

impl FailureKind {
    /// Classify an error returned by a connect attempt.
    pub fn of(error: &DocqrError) -> Self {
        match error {
            DocqrError::Network(_) | DocqrError::Timeout(_) | DocqrError::Io(_) => {
                FailureKind::Network
            }
            DocqrError::ServerSelection(_) => FailureKind::ServerSelection,
            DocqrError::ConnectionExhausted { source, .. } => FailureKind::of(source),
            _ => FailureKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Network => "network",
            FailureKind::ServerSelection => "server_selection",
            FailureKind::Other => "other",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asynchronous notification emitted by a driver after a connection is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The driver observed an error on the connection (e.g. failed heartbeat).
    Error(String),
    /// The connection was closed or lost.
    Disconnected,
    /// The driver recovered the connection on its own.
    Restored,
}

/// A live database connection
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "mongodb", "memory")
    fn driver_name(&self) -> &str;

    /// Name of the database this connection operates on
    fn database_name(&self) -> &str;

    /// Subscribe to asynchronous connection events.
    ///
    /// Every subscriber receives every event sent after it subscribed.
    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent>;

    /// Document metadata store backed by this connection
    fn documents(&self) -> &dyn DocumentStore;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}
