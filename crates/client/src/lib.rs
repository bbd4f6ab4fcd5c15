// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! pulse - realtime channel client with a durable outbound queue.
//!
//! This crate keeps a single WebSocket connection to a realtime server,
//! fans inbound events out to typed channel subscriptions, and delivers
//! outbound messages through a queue that survives restarts.
//!
//! # Main Components
//!
//! - [`ConnectionManager`] - one shared connection with heartbeat, reconnect,
//!   listener dispatch and client-side rate limiting
//! - [`Channels`] - typed subscriptions for each server channel
//! - [`OutboundQueue`] - persisted queue with retries and connectivity-driven
//!   processing
//! - [`Config`] - `pulse.toml` plus `PULSE_*` environment overrides
//!
//! ```rust,ignore
//! use pulse::{Channels, Config, ConnectionManager, LogFilter};
//!
//! let config = Config::resolve()?;
//! let manager = ConnectionManager::new(config.connection.clone());
//! let channels = Channels::new(manager, Some(token));
//! let _logs = channels.subscribe_logs(&LogFilter::default(), |kind, data| {
//!     println!("{kind}: {data}");
//!     Ok(())
//! })?;
//! ```

mod cli;
mod commands;

pub mod channels;
pub mod config;
pub mod connection;
pub mod env;
pub mod error;
pub mod queue;

pub use channels::{
    Channel, ChannelFilter, ChannelListener, Channels, IntegrationFilter, KnowledgeItemsFilter,
    KnowledgeProgressFilter, KnowledgeSearchFilter, LoadBalancingFilter, LogFilter,
    NotificationFilter, Subscription, TaskFilter, WorkflowFilter,
};
pub use cli::{Cli, Command, DeliveryArgs, OutputFormat, QueueCommand};
pub use config::{Config, ConnectionConfig, QueueConfig};
pub use connection::{ConnectOutcome, ConnectionManager, Endpoint, SendError};
pub use error::{Error, Result};
pub use queue::{OutboundQueue, QueueError};

/// Runs a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve_with(cli.config.as_deref())?;

    match cli.command {
        Command::Tail {
            channel,
            filters,
            token,
            count,
            output,
        } => commands::tail::run(&config, channel, filters, token, count, output).await,
        Command::Send {
            message,
            session,
            context,
            delivery,
        } => commands::send::run(&config, message, session, context, delivery).await,
        Command::Queue(command) => commands::queue::run(&config, command).await,
        Command::Channels { output } => commands::channels::run(output),
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
