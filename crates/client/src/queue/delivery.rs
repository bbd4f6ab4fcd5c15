// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery mechanisms for queued messages.

use std::future::Future;
use std::pin::Pin;

use serde_json::json;

use pulse_core::QueuedMessage;

use crate::connection::{ConnectionManager, Transport, WebSocketTransport};

/// Error reported by a delivery attempt; stored on the message.
pub type DeliveryError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one delivery attempt.
pub type DeliveryResult = Result<(), DeliveryError>;

/// Transmits one queued message.
///
/// An `Ok` means the message is sent; any error counts as a failed attempt.
pub trait Delivery: Send + Sync {
    fn deliver<'a>(
        &'a self,
        message: &'a QueuedMessage,
    ) -> Pin<Box<dyn Future<Output = DeliveryResult> + Send + 'a>>;
}

/// Delivers queued messages over a [`ConnectionManager`].
///
/// Each message goes out as a frame of the configured type carrying
/// `{id, sessionId, message, context}`. Rate limiting and connection loss
/// surface as failed attempts.
pub struct ConnectionDelivery<T: Transport + 'static = WebSocketTransport> {
    manager: ConnectionManager<T>,
    kind: String,
}

impl<T: Transport + 'static> ConnectionDelivery<T> {
    pub fn new(manager: ConnectionManager<T>, kind: impl Into<String>) -> Self {
        ConnectionDelivery {
            manager,
            kind: kind.into(),
        }
    }

    /// Frame type used for queued messages.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl<T: Transport + 'static> Delivery for ConnectionDelivery<T> {
    fn deliver<'a>(
        &'a self,
        message: &'a QueuedMessage,
    ) -> Pin<Box<dyn Future<Output = DeliveryResult> + Send + 'a>> {
        Box::pin(async move {
            let data = json!({
                "id": message.id,
                "sessionId": message.session_id,
                "message": message.message,
                "context": message.context,
            });
            self.manager.send(&self.kind, Some(data)).await?;
            Ok(())
        })
    }
}
