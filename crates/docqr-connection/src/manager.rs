//! Connection manager: connect with retry and track liveness

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use docqr_core::{
    Connection, ConnectionEvent, ConnectionState, ConnectionTarget, DatabaseDriver, DocqrError,
    FailureKind, Result, sanitize_uri,
};
use parking_lot::RwLock;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

use crate::retry::RetryPolicy;

/// The held connection and the task translating its events into state.
struct ActiveConnection {
    connection: Arc<dyn Connection>,
    watcher: JoinHandle<()>,
}

impl ActiveConnection {
    async fn shutdown(self) -> Result<()> {
        self.watcher.abort();
        self.connection.close().await
    }
}

/// Owns the single logical database connection of the process.
///
/// Connecting retries according to a [`RetryPolicy`]. Once connected, a
/// background task follows the driver's event stream and keeps
/// [`state`](Self::state) current, so [`is_live`](Self::is_live) never
/// touches the network.
pub struct ConnectionManager {
    driver: Arc<dyn DatabaseDriver>,

    /// Shared with the event watcher task only
    state: Arc<RwLock<ConnectionState>>,

    /// Held connection; async mutex so teardown can await `close()`
    active: Mutex<Option<ActiveConnection>>,

    /// Attempts made by the most recent connect sequence
    attempts_made: AtomicU32,
}

impl ConnectionManager {
    /// Create a manager that connects through the given driver
    pub fn new(driver: Arc<dyn DatabaseDriver>) -> Self {
        Self {
            driver,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            active: Mutex::new(None),
            attempts_made: AtomicU32::new(0),
        }
    }

    /// Get the driver this manager connects through
    pub fn driver(&self) -> &Arc<dyn DatabaseDriver> {
        &self.driver
    }

    /// Connect to `uri`, retrying according to `policy`.
    ///
    /// A malformed `uri` fails immediately with [`DocqrError::UriParse`]
    /// without making an attempt or touching the state. A connection that is
    /// already held is closed first. When every attempt fails the state ends
    /// up `Failed` and the last error is returned inside
    /// [`DocqrError::ConnectionExhausted`].
    #[tracing::instrument(skip(self, uri, policy), fields(driver = self.driver.id(), uri = %sanitize_uri(uri)))]
    pub async fn connect(&self, uri: &str, policy: &RetryPolicy) -> Result<Arc<dyn Connection>> {
        let target = ConnectionTarget::parse(uri)?;

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            tracing::info!("closing previous connection before reconnecting");
            if let Err(e) = previous.shutdown().await {
                tracing::warn!(error = %e, "failed to close previous connection");
            }
            self.set_state(ConnectionState::Disconnected);
        }

        self.attempts_made.store(0, Ordering::SeqCst);
        self.set_state(ConnectionState::Connecting);

        let max_attempts = policy.max_attempts();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            self.attempts_made.store(attempt, Ordering::SeqCst);
            tracing::info!(attempt, max_attempts, target = %target, "connecting to database");

            let outcome =
                match tokio::time::timeout(policy.attempt_timeout(), self.driver.connect(uri)).await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(DocqrError::Timeout(format!(
                        "connect attempt did not complete within {:?}",
                        policy.attempt_timeout()
                    ))),
                };

            match outcome {
                Ok(connection) => {
                    let events = connection.subscribe();
                    self.set_state(ConnectionState::Connected);
                    let watcher = self.spawn_watcher(events);
                    *active = Some(ActiveConnection {
                        connection: Arc::clone(&connection),
                        watcher,
                    });

                    tracing::info!(
                        attempt,
                        database = connection.database_name(),
                        "database connection established"
                    );
                    return Ok(connection);
                }
                Err(error) => {
                    let failure = FailureKind::of(&error);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        failure = %failure,
                        error = %error,
                        "connect attempt failed"
                    );
                    if target.is_srv() {
                        log_hosted_cluster_hints(failure);
                    }
                    last_error = Some(error);

                    if attempt < max_attempts {
                        let delay = policy.delay_before_retry(attempt);
                        tracing::info!(
                            delay_ms = delay.as_millis() as u64,
                            remaining = max_attempts - attempt,
                            "retrying database connection"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        self.set_state(ConnectionState::Failed);
        let source = last_error
            .unwrap_or_else(|| DocqrError::Connection("no connect attempt was made".into()));
        tracing::error!(attempts = max_attempts, error = %source, "giving up on database connection");

        Err(DocqrError::ConnectionExhausted {
            attempts: max_attempts,
            source: Box::new(source),
        })
    }

    /// Whether the connection is currently usable. Never does I/O.
    pub fn is_live(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Get the held connection, or `None` unless it is live
    pub async fn connection(&self) -> Option<Arc<dyn Connection>> {
        if !self.is_live() {
            return None;
        }
        let active = self.active.lock().await;
        active.as_ref().map(|a| Arc::clone(&a.connection))
    }

    /// Close the held connection, if any. Safe to call repeatedly.
    #[tracing::instrument(skip(self))]
    pub async fn disconnect(&self) -> Result<()> {
        let mut active = self.active.lock().await;
        let result = match active.take() {
            Some(previous) => {
                tracing::info!("disconnecting from database");
                previous.shutdown().await
            }
            None => Ok(()),
        };
        self.set_state(ConnectionState::Disconnected);
        result
    }

    /// Number of attempts made by the most recent connect sequence
    pub fn attempts_made(&self) -> u32 {
        self.attempts_made.load(Ordering::SeqCst)
    }

    fn set_state(&self, next: ConnectionState) {
        let previous = std::mem::replace(&mut *self.state.write(), next);
        if previous != next {
            tracing::debug!(from = %previous, to = %next, "connection state changed");
        }
    }

    fn spawn_watcher(&self, mut events: broadcast::Receiver<ConnectionEvent>) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => apply_event(&state, event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "missed connection events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!("connection event stream ended");
                        break;
                    }
                }
            }
        })
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.active.try_lock()
            && let Some(active) = guard.take()
        {
            active.watcher.abort();
        }
    }
}

fn apply_event(state: &RwLock<ConnectionState>, event: ConnectionEvent) {
    let next = match event {
        ConnectionEvent::Error(message) => {
            tracing::error!(error = %message, "database connection error");
            ConnectionState::Failed
        }
        ConnectionEvent::Disconnected => {
            tracing::warn!("database connection lost");
            ConnectionState::Disconnected
        }
        ConnectionEvent::Restored => {
            tracing::info!("database connection restored");
            ConnectionState::Connected
        }
    };
    *state.write() = next;
}

fn log_hosted_cluster_hints(failure: FailureKind) {
    match failure {
        FailureKind::ServerSelection => {
            tracing::warn!(
                "no cluster member could be selected; check that this host's IP address is on the cluster's network access list"
            );
            tracing::warn!("also verify the database user name and password in the connection string");
        }
        FailureKind::Network => {
            tracing::warn!(
                "the cluster could not be reached; check outbound access on port 27017 and DNS SRV resolution"
            );
        }
        FailureKind::Other => {}
    }
}
