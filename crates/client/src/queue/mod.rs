// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable outbound message queue.
//!
//! Messages are persisted before any delivery attempt and survive
//! disconnects and restarts. Each processing pass hands pending messages to
//! a [`Delivery`]; failures are retried on later passes with a growing
//! delay until the retry budget is spent.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐     ┌─────────────┐     ┌────────────────────┐
//! │ OutboundQueue │────►│  Delivery   │────►│ ConnectionManager  │
//! │  (in memory)  │◄────│   (trait)   │◄────│ (or caller's path) │
//! └───────────────┘     └─────────────┘     └────────────────────┘
//!        │   ▲
//!        ▼   │ connectivity watch
//! ┌───────────────┐
//! │  QueueStore   │  (outbound_queue.json)
//! └───────────────┘
//! ```

mod delivery;
mod outbound;
mod store;

pub use delivery::{ConnectionDelivery, Delivery, DeliveryError, DeliveryResult};
pub use outbound::{OutboundQueue, QueueListener, QueueSubscription};
pub use store::{decode_messages, FileStore, MemoryStore, QueueStore, QUEUE_KEY};

use pulse_core::MessageStatus;

/// Error type for queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// No message with this id.
    #[error("no queued message with id '{0}'")]
    NotFound(String),

    /// Only failed messages can be retried.
    #[error("message '{id}' is {status}, only failed messages can be retried")]
    NotRetryable { id: String, status: MessageStatus },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Storage backend failure.
    #[error("queue store error: {0}")]
    Store(String),
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

#[cfg(test)]
mod store_tests;
