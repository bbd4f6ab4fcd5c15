// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::info;

use crate::channels::{Channel, Channels};
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::connection::ConnectionManager;
use crate::error::Result;

use super::resolve_token;

pub async fn run(
    config: &Config,
    channel: Channel,
    filters: Vec<(String, String)>,
    token: Option<String>,
    count: Option<usize>,
    output: OutputFormat,
) -> Result<()> {
    let manager = ConnectionManager::new(config.connection.clone());
    manager.on_status(|change| info!(status = %change, "connection"));

    let (tx, mut rx) = mpsc::unbounded_channel::<(String, Value)>();
    let channels = Channels::new(manager.clone(), resolve_token(token));
    let mut subscription = channels.subscribe_raw(channel, &filters, move |kind, data| {
        tx.send((kind.to_string(), data.clone()))
            .map_err(|e| e.to_string().into())
    })?;
    info!(channel = %channel, endpoint = %subscription.endpoint(), "tailing");

    let mut seen = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = rx.recv() => {
                let Some((kind, data)) = event else { break };
                println!("{}", format_event(&kind, &data, output));
                seen += 1;
                if count.is_some_and(|n| seen >= n) {
                    break;
                }
            }
        }
    }

    subscription.unsubscribe();
    manager.disconnect().await;
    Ok(())
}

/// Renders one event as a line of output.
pub fn format_event(kind: &str, data: &Value, output: OutputFormat) -> String {
    match output {
        OutputFormat::Json => json!({"type": kind, "data": data}).to_string(),
        OutputFormat::Text => match data {
            Value::Null => format!("[{kind}]"),
            Value::String(s) => format!("[{kind}] {s}"),
            other => format!("[{kind}] {other}"),
        },
    }
}

#[cfg(test)]
#[path = "tail_tests.rs"]
mod tests;
