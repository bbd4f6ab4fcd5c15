// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use pulse_core::MessageStatus;

use crate::channels::Channel;

/// Default frame type for messages delivered from the queue.
pub const DEFAULT_MESSAGE_TYPE: &str = "message";

/// Default endpoint used to deliver queued messages.
pub const DEFAULT_SEND_ENDPOINT: &str = "messages";

/// Parse a channel name.
fn parse_channel(s: &str) -> Result<Channel, String> {
    s.parse::<Channel>().map_err(|e| e.to_string())
}

/// Parse a `key=value` filter.
pub fn parse_filter(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

/// Parse a queued-message status.
fn parse_status(s: &str) -> Result<MessageStatus, String> {
    s.parse::<MessageStatus>().map_err(|e| e.to_string())
}

/// Parse a JSON argument.
fn parse_json(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Realtime channel client with a durable outbound queue")]
pub struct Cli {
    /// Read configuration from <path> instead of pulse.toml
    #[arg(short = 'c', long = "config", global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream events from a channel until interrupted
    Tail {
        /// Channel to subscribe to
        #[arg(value_parser = parse_channel)]
        channel: Channel,

        /// Channel filter (repeatable), e.g. level=error
        #[arg(short = 'f', long = "filter", value_parser = parse_filter, value_name = "key=value")]
        filters: Vec<(String, String)>,

        /// Auth token (defaults to PULSE_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Stop after this many events
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Output format
        #[arg(short = 'o', long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Queue a message and deliver it over the connection
    Send {
        /// Message payload as JSON
        #[arg(value_parser = parse_json)]
        message: serde_json::Value,

        /// Session the message belongs to
        #[arg(short = 's', long)]
        session: Option<String>,

        /// Extra context as JSON
        #[arg(long, value_parser = parse_json)]
        context: Option<serde_json::Value>,

        #[command(flatten)]
        delivery: DeliveryArgs,
    },

    /// Inspect and manage the durable outbound queue
    #[command(subcommand)]
    Queue(QueueCommand),

    /// List channels with their filters and event types
    Channels {
        /// Output format
        #[arg(short = 'o', long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Print the effective configuration
    Config,
}

/// Where and how queued messages are delivered.
#[derive(clap::Args, Debug, Clone)]
pub struct DeliveryArgs {
    /// Endpoint to deliver through
    #[arg(long, default_value = DEFAULT_SEND_ENDPOINT)]
    pub endpoint: String,

    /// Frame type for delivered messages
    #[arg(long = "type", default_value = DEFAULT_MESSAGE_TYPE)]
    pub kind: String,

    /// Auth token (defaults to PULSE_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Seconds to wait for delivery
    #[arg(long, default_value = "10")]
    pub wait: u64,
}

#[derive(Subcommand, Debug)]
pub enum QueueCommand {
    /// List queued messages
    List {
        /// Only show messages with this status
        #[arg(short = 's', long, value_parser = parse_status)]
        status: Option<MessageStatus>,

        /// Output format
        #[arg(short = 'o', long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Reset a failed message to pending
    Retry {
        /// Message id
        id: String,
    },

    /// Remove a message
    Remove {
        /// Message id
        id: String,
    },

    /// Remove every message
    Clear,

    /// Connect and deliver pending messages
    Flush {
        #[command(flatten)]
        delivery: DeliveryArgs,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
