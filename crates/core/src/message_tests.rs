// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use yare::parameterized;

struct FixedClock(u64);

impl ClockSource for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

fn pending_message() -> QueuedMessage {
    QueuedMessage::create(&FixedClock(1_700_000_000_000), json!({"text": "hi"}), None, None)
}

#[test]
fn create_uses_clock_for_id_and_timestamp() {
    let msg = QueuedMessage::create(
        &FixedClock(1_700_000_000_000),
        json!("payload"),
        Some("session-1".into()),
        Some(json!({"agent": "a1"})),
    );
    assert!(msg.id.starts_with("1700000000000-"));
    assert_eq!(msg.timestamp.timestamp_millis(), 1_700_000_000_000);
    assert_eq!(msg.status, MessageStatus::Pending);
    assert_eq!(msg.retry_count, 0);
    assert_eq!(msg.session_id.as_deref(), Some("session-1"));
}

#[test]
fn generated_ids_have_base36_suffix() {
    let mut rng = StdRng::seed_from_u64(7);
    let id = generate_id(42, &mut rng);
    let (millis, suffix) = id.split_once('-').unwrap();
    assert_eq!(millis, "42");
    assert_eq!(suffix.len(), 9);
    assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
}

#[test]
fn generated_ids_are_unique_within_a_millisecond() {
    let mut rng = StdRng::seed_from_u64(1);
    let ids: std::collections::HashSet<_> = (0..500).map(|_| generate_id(1, &mut rng)).collect();
    assert_eq!(ids.len(), 500);
}

#[test]
fn failure_below_budget_returns_to_pending() {
    let mut msg = pending_message();
    msg.begin_send();
    assert!(!msg.record_failure("timeout", 3));
    assert_eq!(msg.status, MessageStatus::Pending);
    assert_eq!(msg.retry_count, 1);
    assert_eq!(msg.error.as_deref(), Some("timeout"));
    assert!(msg.is_deliverable(3));
}

#[test]
fn failure_at_last_attempt_is_terminal() {
    let mut msg = pending_message();
    msg.retry_count = 2;
    msg.begin_send();
    assert!(msg.record_failure("timeout", 3));
    assert_eq!(msg.status, MessageStatus::Failed);
    assert_eq!(msg.retry_count, 3);
    assert!(!msg.is_deliverable(3));
}

#[test]
fn retry_count_never_exceeds_budget() {
    let mut msg = pending_message();
    for _ in 0..10 {
        msg.record_failure("boom", 3);
    }
    assert_eq!(msg.retry_count, 3);
}

#[test]
fn reset_for_retry_clears_budget_and_error() {
    let mut msg = pending_message();
    msg.retry_count = 2;
    assert!(msg.record_failure("gave up", 3));
    msg.reset_for_retry();
    assert_eq!(msg.status, MessageStatus::Pending);
    assert_eq!(msg.retry_count, 0);
    assert!(msg.error.is_none());
}

#[parameterized(
    sending = { MessageStatus::Sending, true, MessageStatus::Pending },
    pending = { MessageStatus::Pending, false, MessageStatus::Pending },
    sent = { MessageStatus::Sent, false, MessageStatus::Sent },
    failed = { MessageStatus::Failed, false, MessageStatus::Failed },
)]
fn recover_interrupted(initial: MessageStatus, recovered: bool, expected: MessageStatus) {
    let mut msg = pending_message();
    msg.status = initial;
    assert_eq!(msg.recover_interrupted(), recovered);
    assert_eq!(msg.status, expected);
}

#[parameterized(
    pending = { "pending", MessageStatus::Pending },
    sending = { "sending", MessageStatus::Sending },
    sent = { "sent", MessageStatus::Sent },
    failed_upper = { "FAILED", MessageStatus::Failed },
)]
fn status_parse(input: &str, expected: MessageStatus) {
    assert_eq!(input.parse::<MessageStatus>().unwrap(), expected);
}

#[test]
fn status_parse_rejects_unknown() {
    assert!("queued".parse::<MessageStatus>().is_err());
}

#[test]
fn persisted_field_names_are_camel_case() {
    let mut msg = pending_message();
    msg.session_id = Some("s1".into());
    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"sessionId\":\"s1\""));
    assert!(json.contains("\"retryCount\":0"));
    assert!(json.contains("\"status\":\"pending\""));
    assert!(!json.contains("\"error\""));
}

#[test]
fn loads_record_with_millisecond_timestamp_and_missing_fields() {
    let raw = json!({
        "id": "1700000000000-abc",
        "message": {"text": "legacy"},
        "timestamp": 1_700_000_000_000_i64
    });
    let msg: QueuedMessage = serde_json::from_value(raw).unwrap();
    assert_eq!(msg.timestamp.timestamp_millis(), 1_700_000_000_000);
    assert_eq!(msg.status, MessageStatus::Pending);
    assert_eq!(msg.retry_count, 0);
}

#[test]
fn loads_record_with_snake_case_fields() {
    let raw = json!({
        "id": "1-x",
        "session_id": "s9",
        "retry_count": 2,
        "status": "sending",
        "timestamp": "2026-03-01T10:00:00Z"
    });
    let msg: QueuedMessage = serde_json::from_value(raw).unwrap();
    assert_eq!(msg.session_id.as_deref(), Some("s9"));
    assert_eq!(msg.retry_count, 2);
    assert_eq!(msg.status, MessageStatus::Sending);
}

#[test]
fn record_without_id_is_rejected() {
    let raw = json!({"message": "orphan"});
    assert!(serde_json::from_value::<QueuedMessage>(raw).is_err());
}
