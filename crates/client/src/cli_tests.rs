// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use clap::CommandFactory;
use serde_json::json;
use yare::parameterized;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("pulse").chain(args.iter().copied())).unwrap()
}

#[test]
fn cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[parameterized(
    simple = { "level=error", "level", "error" },
    empty_value = { "level=", "level", "" },
    equals_in_value = { "query=a=b", "query", "a=b" },
    trims_key = { " level =warn", "level", "warn" },
)]
fn filter_parses(input: &str, key: &str, value: &str) {
    assert_eq!(parse_filter(input).unwrap(), (key.to_string(), value.to_string()));
}

#[parameterized(
    no_equals = { "level" },
    empty_key = { "=error" },
)]
fn filter_rejects(input: &str) {
    assert!(parse_filter(input).is_err());
}

#[test]
fn tail_with_filters() {
    let cli = parse(&["tail", "logs", "-f", "level=error", "--filter", "agent_id=a1", "-n", "5"]);
    match cli.command {
        Command::Tail {
            channel,
            filters,
            count,
            output,
            token,
        } => {
            assert_eq!(channel, Channel::Logs);
            assert_eq!(
                filters,
                vec![
                    ("level".to_string(), "error".to_string()),
                    ("agent_id".to_string(), "a1".to_string()),
                ]
            );
            assert_eq!(count, Some(5));
            assert_eq!(output, OutputFormat::Text);
            assert!(token.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn tail_rejects_unknown_channel() {
    let err = Cli::try_parse_from(["pulse", "tail", "metrics"]).unwrap_err();
    assert!(err.to_string().contains("unknown channel"));
}

#[test]
fn send_parses_json_and_defaults() {
    let cli = parse(&["send", r#"{"text":"hi"}"#, "-s", "s1"]);
    match cli.command {
        Command::Send {
            message,
            session,
            context,
            delivery,
        } => {
            assert_eq!(message, json!({"text": "hi"}));
            assert_eq!(session.as_deref(), Some("s1"));
            assert!(context.is_none());
            assert_eq!(delivery.endpoint, DEFAULT_SEND_ENDPOINT);
            assert_eq!(delivery.kind, DEFAULT_MESSAGE_TYPE);
            assert_eq!(delivery.wait, 10);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn send_rejects_invalid_json() {
    assert!(Cli::try_parse_from(["pulse", "send", "{oops"]).is_err());
}

#[test]
fn queue_subcommands() {
    assert!(matches!(
        parse(&["queue", "list", "-o", "json"]).command,
        Command::Queue(QueueCommand::List {
            status: None,
            output: OutputFormat::Json
        })
    ));
    assert!(matches!(
        parse(&["queue", "list", "--status", "FAILED"]).command,
        Command::Queue(QueueCommand::List {
            status: Some(MessageStatus::Failed),
            ..
        })
    ));
    let err = Cli::try_parse_from(["pulse", "queue", "list", "-s", "queued"]).unwrap_err();
    assert!(err.to_string().contains("invalid status: 'queued'"));
    assert!(matches!(
        parse(&["queue", "retry", "1-abc"]).command,
        Command::Queue(QueueCommand::Retry { id }) if id == "1-abc"
    ));
    assert!(matches!(
        parse(&["queue", "clear"]).command,
        Command::Queue(QueueCommand::Clear)
    ));
}

#[test]
fn global_flags_after_subcommand() {
    let cli = parse(&["queue", "list", "--verbose", "--config", "/tmp/p.toml"]);
    assert!(cli.verbose);
    assert_eq!(cli.config.unwrap(), std::path::PathBuf::from("/tmp/p.toml"));
}
