// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

const BASE: &str = "ws://localhost:8000/ws";

#[test]
fn bare_endpoint() {
    let ep = Endpoint::new("logs");
    assert_eq!(ep.path_and_query(), "logs");
    assert_eq!(ep.to_url(BASE, None).unwrap(), "ws://localhost:8000/ws/logs");
}

#[test]
fn token_only() {
    let url = Endpoint::new("tasks").to_url(BASE, Some("abc123")).unwrap();
    assert_eq!(url, "ws://localhost:8000/ws/tasks?token=abc123");
}

#[test]
fn token_precedes_channel_params() {
    let ep = Endpoint::new("logs").param("level", "error");
    assert_eq!(ep.path_and_query(), "logs?level=error");
    assert_eq!(
        ep.to_url(BASE, Some("t")).unwrap(),
        "ws://localhost:8000/ws/logs?token=t&level=error"
    );
}

#[test]
fn empty_token_is_omitted() {
    let url = Endpoint::new("logs").to_url(BASE, Some("")).unwrap();
    assert_eq!(url, "ws://localhost:8000/ws/logs");
}

#[test]
fn values_are_url_encoded() {
    let ep = Endpoint::new("knowledge/search").param("query", "rust & tokio");
    assert_eq!(ep.path_and_query(), "knowledge/search?query=rust+%26+tokio");
}

#[test]
fn optional_params_skip_none() {
    let ep = Endpoint::new("logs")
        .param_opt("agent_id", Some("a1"))
        .param_opt::<String>("task_id", None)
        .param_opt("level", Some("warn"));
    assert_eq!(ep.path_and_query(), "logs?agent_id=a1&level=warn");
}

#[test]
fn trailing_slashes_are_normalized() {
    let url = Endpoint::new("/workflows/").to_url("ws://host/ws/", None).unwrap();
    assert_eq!(url, "ws://host/ws/workflows");
}

#[parameterized(
    empty = { "" },
    whitespace = { "my logs" },
    question = { "logs?level=x" },
    hash = { "logs#x" },
    double_slash = { "knowledge//items" },
)]
fn invalid_names_are_rejected(name: &str) {
    assert!(Endpoint::new(name).to_url(BASE, None).is_err());
}

#[test]
fn invalid_base_is_rejected() {
    assert!(Endpoint::new("logs").to_url("not a url", None).is_err());
}
