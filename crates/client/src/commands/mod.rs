// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod channels;
pub mod queue;
pub mod send;
pub mod tail;

use std::sync::Arc;

use crate::config::Config;
use crate::connection::{ConnectionManager, Transport};
use crate::env;
use crate::error::Result;
use crate::queue::{ConnectionDelivery, FileStore, OutboundQueue};

/// Token from the command line, falling back to `PULSE_TOKEN`.
pub fn resolve_token(arg: Option<String>) -> Option<String> {
    arg.filter(|t| !t.is_empty()).or_else(env::token)
}

/// Opens the durable queue in the configured state directory, delivering
/// frames of type `kind` through `manager`.
pub fn open_queue<T: Transport + 'static>(
    config: &Config,
    manager: &ConnectionManager<T>,
    kind: &str,
) -> Result<OutboundQueue> {
    let store = FileStore::new(config.queue.resolved_state_dir());
    let delivery = Arc::new(ConnectionDelivery::new(manager.clone(), kind));
    let queue = OutboundQueue::open(config.queue.clone(), store, delivery, manager.connectivity())?;
    Ok(queue)
}
