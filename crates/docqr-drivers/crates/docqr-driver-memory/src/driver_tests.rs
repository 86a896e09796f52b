//! Unit tests for the in-memory driver

use super::*;
use docqr_core::{
    Connection, ConnectionEvent, DatabaseDriver, DocqrError, DocumentStore, FailureKind, NewDocument,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[test]
fn test_memory_driver_metadata() {
    let driver = MemoryDriver::new();
    assert_eq!(driver.id(), "memory");
    assert!(driver.accepts("memory://local"));
    assert!(!driver.accepts("mongodb://localhost"));
    assert_eq!(driver.default_port(), None);
}

#[tokio::test]
async fn test_connect_names_database_after_host() {
    let driver = MemoryDriver::new();
    let conn = driver.connect("memory://library").await.unwrap();

    assert_eq!(conn.driver_name(), "memory");
    assert_eq!(conn.database_name(), "library");
    assert!(!conn.is_closed());
    assert_eq!(driver.connect_calls(), 1);
}

#[tokio::test]
async fn test_records_survive_reconnect() {
    let driver = MemoryDriver::new();

    let first = driver.connect("memory://library").await.unwrap();
    first
        .documents()
        .insert(NewDocument::new("a.pdf", "a.pdf"))
        .await
        .unwrap();
    first.close().await.unwrap();

    let second = driver.connect("memory://library").await.unwrap();
    assert_eq!(second.documents().count().await.unwrap(), 1);

    let other = driver.connect("memory://elsewhere").await.unwrap();
    assert_eq!(other.documents().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_injected_failures_are_consumed() {
    let driver = MemoryDriver::new();
    driver.fail_next_connects(2, FailureKind::ServerSelection);

    for _ in 0..2 {
        let err = match driver.connect("memory://local").await {
            Ok(_) => panic!("connect should fail"),
            Err(e) => e,
        };
        assert!(matches!(err, DocqrError::ServerSelection(_)));
        assert_eq!(FailureKind::of(&err), FailureKind::ServerSelection);
    }

    assert!(driver.connect("memory://local").await.is_ok());
    assert_eq!(driver.connect_calls(), 3);
}

#[tokio::test]
async fn test_close_emits_disconnected_once() {
    let driver = MemoryDriver::new();
    let conn = driver.connect("memory://local").await.unwrap();
    let mut events = conn.subscribe();

    conn.close().await.unwrap();
    conn.close().await.unwrap();

    assert!(conn.is_closed());
    assert_eq!(events.recv().await.unwrap(), ConnectionEvent::Disconnected);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_emit_reaches_subscribers() {
    let driver = MemoryDriver::new();
    let conn = driver.connect("memory://local").await.unwrap();
    let mut events = conn.subscribe();

    driver
        .last_connection()
        .unwrap()
        .emit(ConnectionEvent::Error("heartbeat failed".into()));

    assert_eq!(
        events.recv().await.unwrap(),
        ConnectionEvent::Error("heartbeat failed".into())
    );
}

#[tokio::test]
async fn test_driver_holds_only_latest_connection() {
    let driver = MemoryDriver::new();

    let first = driver.connect("memory://library").await.unwrap();
    first.close().await.unwrap();
    drop(first);
    let _second = driver.connect("memory://library").await.unwrap();

    let latest = driver.last_connection().unwrap();
    assert!(!latest.is_closed());
    // driver slot plus `_second` and `latest`; `first` is gone
    assert_eq!(Arc::strong_count(&latest), 3);
}
