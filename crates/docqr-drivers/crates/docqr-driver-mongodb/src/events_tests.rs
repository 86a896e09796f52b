//! Unit tests for server event translation

use crate::events::HeartbeatTracker;
use docqr_core::{ConnectionEvent, EVENT_CHANNEL_CAPACITY};
use pretty_assertions::assert_eq;
use tokio::sync::broadcast;

fn tracker() -> HeartbeatTracker {
    let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    HeartbeatTracker::new(sender)
}

#[test]
fn test_first_failure_reports_error() {
    let tracker = tracker();

    let event = tracker.heartbeat_failed("db1:27017", "connection reset");
    assert_eq!(
        event,
        Some(ConnectionEvent::Error(
            "heartbeat to db1:27017 failed: connection reset".into()
        ))
    );

    // repeated failures do not repeat the error
    assert_eq!(tracker.heartbeat_failed("db1:27017", "connection reset"), None);
    assert_eq!(tracker.heartbeat_failed("db2:27017", "timed out"), None);
}

#[test]
fn test_restored_once_all_servers_recover() {
    let tracker = tracker();
    tracker.heartbeat_failed("db1:27017", "reset");
    tracker.heartbeat_failed("db2:27017", "reset");

    assert_eq!(tracker.heartbeat_succeeded("db1:27017"), None);
    assert_eq!(
        tracker.heartbeat_succeeded("db2:27017"),
        Some(ConnectionEvent::Restored)
    );
}

#[test]
fn test_success_without_failure_is_silent() {
    let tracker = tracker();
    assert_eq!(tracker.heartbeat_succeeded("db1:27017"), None);
}

#[test]
fn test_topology_closed_disconnects_and_resets() {
    let tracker = tracker();
    tracker.heartbeat_failed("db1:27017", "reset");

    assert_eq!(tracker.topology_closed(), Some(ConnectionEvent::Disconnected));
    assert_eq!(tracker.heartbeat_succeeded("db1:27017"), None);
}
