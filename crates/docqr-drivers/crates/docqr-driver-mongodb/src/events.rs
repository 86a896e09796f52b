//! Forwarding of server monitoring events to connection subscribers

use docqr_core::ConnectionEvent;
use mongodb::event::EventHandler;
use mongodb::event::sdam::SdamEvent;
use parking_lot::Mutex;
use std::collections::HashSet;
use tokio::sync::broadcast;

/// Create the monitoring callback installed on every client.
pub(crate) fn handler(sender: broadcast::Sender<ConnectionEvent>) -> EventHandler<SdamEvent> {
    let tracker = HeartbeatTracker::new(sender);
    EventHandler::callback(move |event: SdamEvent| tracker.observe(&event))
}

/// Turns per-server heartbeat results into connection-level transitions.
///
/// The first failing server yields `Error`; once every failing server has
/// answered again, `Restored` is sent. Closing the topology yields
/// `Disconnected`.
pub(crate) struct HeartbeatTracker {
    sender: broadcast::Sender<ConnectionEvent>,
    failing: Mutex<HashSet<String>>,
}

impl HeartbeatTracker {
    pub(crate) fn new(sender: broadcast::Sender<ConnectionEvent>) -> Self {
        Self {
            sender,
            failing: Mutex::new(HashSet::new()),
        }
    }

    fn observe(&self, event: &SdamEvent) {
        let translated = match event {
            SdamEvent::ServerHeartbeatFailed(ev) => {
                self.heartbeat_failed(&ev.server_address.to_string(), &ev.failure.to_string())
            }
            SdamEvent::ServerHeartbeatSucceeded(ev) => {
                self.heartbeat_succeeded(&ev.server_address.to_string())
            }
            SdamEvent::TopologyClosed(_) => self.topology_closed(),
            _ => None,
        };

        if let Some(event) = translated {
            self.emit(event);
        }
    }

    pub(crate) fn heartbeat_failed(&self, address: &str, failure: &str) -> Option<ConnectionEvent> {
        let mut failing = self.failing.lock();
        let first_failure = failing.is_empty();
        failing.insert(address.to_string());

        first_failure.then(|| {
            tracing::warn!(server = address, error = failure, "server heartbeat failed");
            ConnectionEvent::Error(format!("heartbeat to {address} failed: {failure}"))
        })
    }

    pub(crate) fn heartbeat_succeeded(&self, address: &str) -> Option<ConnectionEvent> {
        let mut failing = self.failing.lock();
        if failing.remove(address) && failing.is_empty() {
            tracing::info!(server = address, "server heartbeat recovered");
            Some(ConnectionEvent::Restored)
        } else {
            None
        }
    }

    pub(crate) fn topology_closed(&self) -> Option<ConnectionEvent> {
        self.failing.lock().clear();
        Some(ConnectionEvent::Disconnected)
    }

    fn emit(&self, event: ConnectionEvent) {
        // No receivers simply means nobody is watching yet.
        let _ = self.sender.send(event);
    }
}
