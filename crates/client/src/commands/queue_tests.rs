// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use pulse_core::MessageStatus;
use serde_json::{json, Value};
use tempfile::TempDir;

use super::*;
use crate::error::Error;
use crate::queue::QueueError;

fn message(id: &str) -> QueuedMessage {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
    QueuedMessage::new(id.to_string(), json!({"text": id}), None, None, at)
}

fn config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.queue.state_dir = Some(dir.path().to_path_buf());
    config
}

fn seed(config: &Config, count: usize) -> Vec<String> {
    let manager = ConnectionManager::new(config.connection.clone());
    let queue = open_queue(config, &manager, DEFAULT_MESSAGE_TYPE).unwrap();
    let ids = (0..count)
        .map(|i| queue.enqueue(json!({"n": i}), None, None).unwrap())
        .collect();
    queue.shutdown();
    ids
}

fn stored(config: &Config) -> Vec<QueuedMessage> {
    let manager = ConnectionManager::new(config.connection.clone());
    let queue = open_queue(config, &manager, DEFAULT_MESSAGE_TYPE).unwrap();
    queue.shutdown();
    queue.get_queue()
}

#[test]
fn empty_queue_text() {
    assert_eq!(format_queue(&[], OutputFormat::Text).unwrap(), "queue is empty\n");
}

#[test]
fn text_rows_show_status_and_error() {
    let mut failed = message("1700000000000-abc");
    failed.session_id = Some("s1".into());
    failed.retry_count = 3;
    failed.status = MessageStatus::Failed;
    failed.error = Some("not connected".into());

    let out = format_queue(&[message("1700000000001-xyz"), failed], OutputFormat::Text).unwrap();
    similar_asserts::assert_eq!(
        out,
        "1700000000001-xyz  pending  retries=0  2026-03-01 12:30:00\n\
         1700000000000-abc  failed   retries=3  2026-03-01 12:30:00  session=s1  error: not connected\n"
    );
}

#[test]
fn json_output_uses_wire_field_names() {
    let mut m = message("1-a");
    m.session_id = Some("s1".into());
    let out = format_queue(&[m], OutputFormat::Json).unwrap();
    let parsed: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed[0]["sessionId"], "s1");
    assert_eq!(parsed[0]["status"], "pending");
    assert_eq!(parsed[0]["retryCount"], 0);
}

#[test]
fn status_filter_keeps_matching_messages() {
    let mut failed = message("2-b");
    failed.status = MessageStatus::Failed;
    let messages = vec![message("1-a"), failed];

    let only_failed = with_status(messages.clone(), Some(MessageStatus::Failed));
    assert_eq!(only_failed.len(), 1);
    assert_eq!(only_failed[0].id, "2-b");
    assert_eq!(with_status(messages, None).len(), 2);
}

#[tokio::test]
async fn list_with_status_reads_the_stored_queue() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    seed(&config, 2);

    let command = QueueCommand::List {
        status: Some(MessageStatus::Pending),
        output: OutputFormat::Json,
    };
    run(&config, command).await.unwrap();
    assert_eq!(stored(&config).len(), 2);
}

#[tokio::test]
async fn remove_and_clear_edit_the_stored_queue() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let ids = seed(&config, 3);

    run(&config, QueueCommand::Remove { id: ids[1].clone() }).await.unwrap();
    let remaining: Vec<String> = stored(&config).into_iter().map(|m| m.id).collect();
    assert_eq!(remaining, vec![ids[0].clone(), ids[2].clone()]);

    run(&config, QueueCommand::Clear).await.unwrap();
    assert!(stored(&config).is_empty());
}

#[tokio::test]
async fn unknown_id_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    seed(&config, 1);

    let err = run(&config, QueueCommand::Remove { id: "nope".into() }).await.unwrap_err();
    assert!(matches!(err, Error::Queue(QueueError::NotFound(id)) if id == "nope"));
}

#[tokio::test]
async fn retry_rejects_pending_message() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let ids = seed(&config, 1);

    let err = run(&config, QueueCommand::Retry { id: ids[0].clone() }).await.unwrap_err();
    assert!(matches!(err, Error::Queue(QueueError::NotRetryable { .. })));
}
