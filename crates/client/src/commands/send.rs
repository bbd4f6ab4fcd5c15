// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use pulse_core::{MessageStatus, QueuedMessage};

use crate::cli::DeliveryArgs;
use crate::config::Config;
use crate::connection::{ConnectionManager, Endpoint, Transport};
use crate::error::Result;
use crate::queue::OutboundQueue;

use super::{open_queue, resolve_token};

/// Interval between passes while waiting for delivery.
const PASS_INTERVAL: Duration = Duration::from_millis(250);

/// Queue state after a delivery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    pub pending: usize,
    pub failed: usize,
}

impl FlushReport {
    fn summary(&self) -> String {
        let mut summary = format!("delivered {}", self.delivered);
        if self.pending > 0 {
            summary.push_str(&format!(
                ", {} still pending (run `pulse queue flush` to retry)",
                self.pending
            ));
        }
        if self.failed > 0 {
            summary.push_str(&format!(", {} failed (see `pulse queue list`)", self.failed));
        }
        summary
    }
}

pub async fn run(
    config: &Config,
    message: Value,
    session: Option<String>,
    context: Option<Value>,
    args: DeliveryArgs,
) -> Result<()> {
    let manager = ConnectionManager::new(config.connection.clone());
    let queue = open_queue(config, &manager, &args.kind)?;
    let id = queue.enqueue(message, session, context)?;
    println!("queued {id}");

    let report = deliver(&manager, &queue, args).await?;
    println!("{}", report.summary());
    Ok(())
}

pub async fn flush(config: &Config, args: DeliveryArgs) -> Result<()> {
    let manager = ConnectionManager::new(config.connection.clone());
    let queue = open_queue(config, &manager, &args.kind)?;
    if outstanding(&queue.get_queue()) == 0 {
        println!("nothing to deliver");
        return Ok(());
    }

    let report = deliver(&manager, &queue, args).await?;
    println!("{}", report.summary());
    Ok(())
}

/// Connects and runs passes until nothing is outstanding or the wait
/// expires, then tears the connection down.
pub async fn deliver<T: Transport + 'static>(
    manager: &ConnectionManager<T>,
    queue: &OutboundQueue,
    args: DeliveryArgs,
) -> Result<FlushReport> {
    let before = queue.len();
    manager.connect(&Endpoint::new(args.endpoint), resolve_token(args.token).as_deref())?;

    let drive = async {
        loop {
            queue.process_queue().await?;
            if outstanding(&queue.get_queue()) == 0 {
                return Ok::<_, crate::error::Error>(());
            }
            tokio::time::sleep(PASS_INTERVAL).await;
        }
    };
    match tokio::time::timeout(Duration::from_secs(args.wait), drive).await {
        Ok(result) => result?,
        Err(_) => warn!(wait_secs = args.wait, "gave up waiting for delivery"),
    }

    queue.shutdown();
    manager.disconnect().await;

    let messages = queue.get_queue();
    let pending = outstanding(&messages);
    let failed = messages
        .iter()
        .filter(|m| m.status == MessageStatus::Failed)
        .count();
    let report = FlushReport {
        delivered: before.saturating_sub(messages.len()),
        pending,
        failed,
    };
    debug!(?report, "delivery finished");
    Ok(report)
}

/// Messages still waiting for an outcome.
fn outstanding(messages: &[QueuedMessage]) -> usize {
    messages
        .iter()
        .filter(|m| matches!(m.status, MessageStatus::Pending | MessageStatus::Sending))
        .count()
}

#[cfg(test)]
#[path = "send_tests.rs"]
mod tests;
