// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for queue persistence.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::store::encode_messages;
use super::*;
use pulse_core::{MessageStatus, QueuedMessage};
use serde_json::json;
use tempfile::tempdir;

fn message(id: &str) -> QueuedMessage {
    QueuedMessage::new(
        id.to_string(),
        json!({"text": id}),
        Some("s1".to_string()),
        None,
        chrono::DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
    )
}

#[test]
fn file_store_missing_record_loads_none() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path().join("state"));
    assert!(store.load().unwrap().is_none());
}

#[test]
fn file_store_saves_under_queue_key() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path().join("state"));

    store.save("[]").unwrap();
    assert_eq!(store.path(), dir.path().join("state").join("outbound_queue.json"));
    assert_eq!(store.load().unwrap().as_deref(), Some("[]"));
}

#[test]
fn file_store_overwrites_and_leaves_no_temp_file() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());

    store.save("[1]").unwrap();
    store.save("[2]").unwrap();

    assert_eq!(store.load().unwrap().as_deref(), Some("[2]"));
    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["outbound_queue.json".to_string()]);
}

#[test]
fn memory_store_is_shared_between_clones() {
    let store = MemoryStore::new();
    let other = store.clone();
    store.save("[]").unwrap();
    assert_eq!(other.contents().as_deref(), Some("[]"));
    assert_eq!(other.saves(), 1);
}

#[test]
fn memory_store_can_refuse_saves() {
    let store = MemoryStore::with_contents("[]");
    store.fail_saves(true);
    assert!(matches!(store.save("[1]"), Err(QueueError::Store(_))));
    assert_eq!(store.contents().as_deref(), Some("[]"));
}

#[test]
fn encoded_messages_decode_back() {
    let messages = vec![message("1-a"), message("2-b")];
    let encoded = encode_messages(&messages).unwrap();
    assert_eq!(decode_messages(&encoded), messages);
}

#[test]
fn decode_skips_unreadable_entries() {
    let contents = json!([
        {"id": "1-a", "message": "hi", "status": "pending"},
        42,
        {"message": "no id"},
        {"id": "2-b", "status": "bogus"},
        {"id": "3-c", "session_id": "s9", "retry_count": 2, "timestamp": 1700000000000u64, "status": "failed"},
    ])
    .to_string();

    let messages = decode_messages(&contents);
    let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["1-a", "3-c"]);
    assert_eq!(messages[1].session_id.as_deref(), Some("s9"));
    assert_eq!(messages[1].retry_count, 2);
    assert_eq!(messages[1].status, MessageStatus::Failed);
}

#[test]
fn decode_tolerates_garbage_records() {
    assert!(decode_messages("").is_empty());
    assert!(decode_messages("not json").is_empty());
    assert!(decode_messages(r#"{"id": "1-a"}"#).is_empty());
}
