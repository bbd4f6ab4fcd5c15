// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::config::{ConnectionConfig, QueueConfig};
use crate::connection::transport_tests::{MockServer, MockTransport};
use crate::queue::{ConnectionDelivery, MemoryStore};

fn setup(server: &MockServer) -> (ConnectionManager<MockTransport>, OutboundQueue) {
    let transports = server.clone();
    let manager = ConnectionManager::with_transport_factory(
        ConnectionConfig::default(),
        Arc::new(move || transports.transport()),
    );
    let delivery = Arc::new(ConnectionDelivery::new(manager.clone(), "message"));
    let queue = OutboundQueue::open(
        QueueConfig::default(),
        MemoryStore::new(),
        delivery,
        manager.connectivity(),
    )
    .unwrap();
    (manager, queue)
}

fn args(wait: u64) -> DeliveryArgs {
    DeliveryArgs {
        endpoint: "messages".to_string(),
        kind: "message".to_string(),
        token: Some("tok".to_string()),
        wait,
    }
}

#[tokio::test(start_paused = true)]
async fn deliver_sends_queued_messages_and_disconnects() {
    let server = MockServer::new();
    let (manager, queue) = setup(&server);
    queue.enqueue(json!({"text": "one"}), None, None).unwrap();
    queue.enqueue(json!({"text": "two"}), None, None).unwrap();

    let report = deliver(&manager, &queue, args(5)).await.unwrap();

    assert_eq!(
        report,
        FlushReport {
            delivered: 2,
            pending: 0,
            failed: 0
        }
    );
    assert_eq!(server.dials(), vec!["ws://localhost:8000/ws/messages?token=tok".to_string()]);
    assert_eq!(server.sent_kinds(), vec!["message", "message"]);
    assert!(!manager.is_connected());
}

#[tokio::test(start_paused = true)]
async fn deliver_gives_up_after_wait() {
    let server = MockServer::new();
    server.refuse_all(true);
    let (manager, queue) = setup(&server);
    queue.enqueue(json!({"text": "stuck"}), None, None).unwrap();

    let report = deliver(&manager, &queue, args(3)).await.unwrap();

    assert_eq!(report.delivered, 0);
    assert_eq!(report.pending, 1);
    assert!(report.summary().contains("still pending"));
}

#[tokio::test(start_paused = true)]
async fn deliver_retries_failed_sends_within_wait() {
    let server = MockServer::new();
    let (manager, queue) = setup(&server);
    queue.enqueue(json!({"text": "flaky"}), None, None).unwrap();
    server.fail_sends(true);

    let driver = tokio::spawn({
        let manager = manager.clone();
        let queue = queue.clone();
        async move { deliver(&manager, &queue, args(10)).await.unwrap() }
    });
    tokio::time::sleep(Duration::from_millis(500)).await;
    server.fail_sends(false);

    let report = driver.await.unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 0);
}

#[test]
fn summary_mentions_failures() {
    let report = FlushReport {
        delivered: 1,
        pending: 0,
        failed: 2,
    };
    assert_eq!(report.summary(), "delivered 1, 2 failed (see `pulse queue list`)");
}
