// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    config = { Error::Config("bad url".into()), "bad url" },
    unknown_channel = { Error::UnknownChannel("metrics".into()), "metrics" },
    not_connected = { Error::Send(SendError::NotConnected), "not connected" },
    rate_limited = { Error::Send(SendError::RateLimited { limit: 90 }), "rate limit" },
    queue_not_found = { Error::Queue(QueueError::NotFound("42-abc".into())), "42-abc" },
)]
fn error_display_contains(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected));
}

#[test]
fn unknown_channel_lists_valid_names() {
    let msg = Error::UnknownChannel("metrics".into()).to_string();
    assert!(msg.starts_with("unknown channel: 'metrics'\n  hint: valid channels are: logs, tasks,"));
    assert!(msg.ends_with("knowledge-search"));
}

#[test]
fn error_from_queue() {
    fn remove() -> Result<()> {
        Err(QueueError::NotFound("1-a".into()))?
    }
    assert!(matches!(remove(), Err(Error::Queue(QueueError::NotFound(id))) if id == "1-a"));
}

#[test]
fn error_from_core() {
    let err: Error = pulse_core::Error::InvalidEndpoint("x y".into()).into();
    assert!(matches!(err, Error::Core(_)));
}

#[test]
fn error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: Error = io_err.into();
    assert!(matches!(err, Error::Io(_)));
}
