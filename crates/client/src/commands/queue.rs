// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use pulse_core::{MessageStatus, QueuedMessage};

use crate::cli::{OutputFormat, QueueCommand, DEFAULT_MESSAGE_TYPE};
use crate::config::Config;
use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::queue::OutboundQueue;

use super::{open_queue, send};

pub async fn run(config: &Config, command: QueueCommand) -> Result<()> {
    match command {
        QueueCommand::Flush { delivery } => send::flush(config, delivery).await,
        QueueCommand::List { status, output } => with_offline_queue(config, |queue| {
            let messages = with_status(queue.get_queue(), status);
            print!("{}", format_queue(&messages, output)?);
            Ok(())
        }),
        QueueCommand::Retry { id } => with_offline_queue(config, |queue| {
            queue.retry(&id)?;
            println!("reset {id} to pending");
            Ok(())
        }),
        QueueCommand::Remove { id } => with_offline_queue(config, |queue| {
            queue.remove(&id)?;
            println!("removed {id}");
            Ok(())
        }),
        QueueCommand::Clear => with_offline_queue(config, |queue| {
            let count = queue.len();
            queue.clear()?;
            println!("cleared {count} message(s)");
            Ok(())
        }),
    }
}

/// Opens the queue without connecting, for inspection and edits.
fn with_offline_queue(
    config: &Config,
    f: impl FnOnce(&OutboundQueue) -> Result<()>,
) -> Result<()> {
    let manager = ConnectionManager::new(config.connection.clone());
    let queue = open_queue(config, &manager, DEFAULT_MESSAGE_TYPE)?;
    let result = f(&queue);
    queue.shutdown();
    result
}

/// Keeps messages in `status`, or all of them when unset.
pub fn with_status(messages: Vec<QueuedMessage>, status: Option<MessageStatus>) -> Vec<QueuedMessage> {
    match status {
        Some(status) => messages.into_iter().filter(|m| m.status == status).collect(),
        None => messages,
    }
}

/// Renders queued messages as a table or JSON array.
pub fn format_queue(messages: &[QueuedMessage], output: OutputFormat) -> Result<String> {
    match output {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(messages)?)),
        OutputFormat::Text => {
            if messages.is_empty() {
                return Ok("queue is empty\n".to_string());
            }
            let width = messages.iter().map(|m| m.id.len()).max().unwrap_or(0);
            let mut out = String::new();
            for m in messages {
                let mut line = format!(
                    "{:width$}  {:<7}  retries={}  {}",
                    m.id,
                    m.status.as_str(),
                    m.retry_count,
                    m.timestamp.format("%Y-%m-%d %H:%M:%S"),
                );
                if let Some(session) = &m.session_id {
                    line.push_str(&format!("  session={session}"));
                }
                if let Some(error) = &m.error {
                    line.push_str(&format!("  error: {error}"));
                }
                out.push_str(&line);
                out.push('\n');
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
